//! # Configuration: queue connection resolution and supervisor settings.
//!
//! - [`ConnectionConfig`]: parameters needed to reach the shared queue backend,
//!   built from build-time defaults plus runtime environment overrides via
//!   [`resolve_connection`].
//! - [`EnvSource`]: where runtime overrides come from ([`ProcessEnv`] in
//!   production, [`MapEnv`] for hosts and tests).
//! - [`WorkerSelection`]: include/exclude name lists passed through to worker registration.
//! - [`SupervisorConfig`]: runtime settings (stop grace, bus capacity).
//!
//! ## Precedence
//! ```text
//! QUEUE_URL present?
//!   ├─ yes ─► defaults + url, lazyConnect = defaults.lazyConnect or true
//!   │         (QUEUE_HOST / QUEUE_PORT / ... ignored entirely)
//!   └─ no  ─► each present QUEUE_* value overrides only its own field
//! ```

mod connection;
mod env;
mod resolver;
mod selection;
mod supervisor;

pub use connection::{ConnectionConfig, Numeric};
pub use env::{EnvSource, MapEnv, ProcessEnv, vars};
pub use resolver::{ConnectionOverrides, resolve_connection};
pub use selection::WorkerSelection;
pub use supervisor::SupervisorConfig;
