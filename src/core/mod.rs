//! Runtime core: orchestration and lifecycle.
//!
//! Public entry points are [`Supervisor`] (cold start to a running
//! [`AppHandle`]) and [`ShutdownCoordinator`] (process-level lifecycle).
//!
//! Internal modules:
//! - [`registry`]: worker slots, connection install, start and stop-all;
//! - [`loader`]: ordered worker-definition modules;
//! - [`supervisor`]: the start sequence;
//! - [`monitor`]: observes job loops and error channels, reports failures;
//! - [`shutdown`]: trigger channel and one-shot teardown;
//! - [`signals`]: cross-platform termination signal handling;
//! - [`entry`]: runs the lifecycle only for the program entry point.

mod builder;
mod entry;
mod handle;
mod loader;
mod monitor;
mod registry;
mod shutdown;
mod signals;
mod supervisor;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::SupervisorBuilder;
pub use entry::Entry;
pub use handle::AppHandle;
pub use loader::{Loader, LoaderFn, ModuleLoader};
pub use registry::Registry;
pub use shutdown::{ExitStatus, Phase, ShutdownCoordinator, ShutdownTrigger, TriggerHandle};
pub use signals::wait_for_shutdown_signal;
pub use supervisor::Supervisor;
