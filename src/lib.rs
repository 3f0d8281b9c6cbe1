//! # jobvisor
//!
//! **Jobvisor** is a lifecycle supervisor for long-running job-queue workers.
//!
//! It resolves the queue connection from build-time defaults and environment
//! overrides, loads worker definitions in a reproducible order, starts every
//! worker in isolation, and tears everything down exactly once when the
//! process is asked to stop.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  defaults (JSON) + QUEUE_* env
//!            │ resolve_connection()
//!            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor::start()                                              │
//! │  1. Registry::install_connection()                                │
//! │  2. ModuleLoader::load_all()  ─► Loader #1 ─► Loader #2 ─► ...    │
//! │  3. log worker names                                              │
//! │  4. attach an error listener to EVERY worker                      │
//! │  5. start every worker (failures isolated)                        │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐       ┌──────────┐       ┌──────────┐
//!   │ Worker A │       │ Worker B │       │ Worker C │   job loops (tokio tasks)
//!   └────┬─────┘       └────┬─────┘       └────┬─────┘
//!        │ ErrorReporter    │                  │
//!        ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                    Bus (broadcast events)                         │
//! └───────────────────────────────────────────────────────────────────┘
//!
//!            AppHandle { workers(), stop(), closed(), events() }
//! ```
//!
//! ### Lifecycle
//! ```text
//! ShutdownCoordinator::run(start)
//!   Init ─► Starting ─► Running ─► Stopping ─► Stopped
//!
//!   triggers: OS signal | natural exit | TriggerHandle::trigger()
//!   first trigger ─► await start ─► AppHandle::stop() (once) ─► ExitStatus::Success
//!   later triggers ─► ignored
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                              |
//! |-------------------|--------------------------------------------------------------|-------------------------------------------------|
//! | **Configuration** | Connection defaults, env overrides, worker selection.         | [`ConnectionConfig`], [`config::EnvSource`]     |
//! | **Workers**       | Long-running queue consumers with an error channel.           | [`Worker`], [`WorkerFn`], [`WorkerContext`]     |
//! | **Loading**       | Ordered worker-definition modules.                            | [`Loader`], [`LoaderFn`], [`ModuleLoader`]      |
//! | **Supervision**   | Cold start to a running application handle.                   | [`Supervisor`], [`AppHandle`]                   |
//! | **Shutdown**      | Exactly-once teardown from many trigger sources.              | [`ShutdownCoordinator`], [`Entry`]              |
//! | **Events**        | Broadcast lifecycle events.                                   | [`Event`], [`EventKind`]                        |
//! | **Errors**        | Typed errors with stable log labels.                          | [`RuntimeError`], [`WorkerError`]               |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use jobvisor::config::MapEnv;
//! use jobvisor::{
//!     ConnectionConfig, LoadError, LoaderFn, Registry, Supervisor, WorkerContext, WorkerError,
//!     WorkerFn,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let defaults = ConnectionConfig::from_json(r#"{"host":"localhost","lazyConnect":false}"#)?;
//!     let env = MapEnv::new().with("QUEUE_URL", "queue://alt:6379");
//!
//!     let sup = Supervisor::builder(defaults)
//!         .with_env(env)
//!         .with_loader(LoaderFn::new("email", |registry: Arc<Registry>| async move {
//!             registry
//!                 .register(WorkerFn::arc("email", |ctx: WorkerContext| async move {
//!                     // consume jobs until stopped
//!                     ctx.cancelled().await;
//!                     Ok::<(), WorkerError>(())
//!                 }))
//!                 .await?;
//!             Ok::<(), LoadError>(())
//!         }))
//!         .build();
//!
//!     let app = sup.start().await?;
//!     let conn = app.connection().expect("installed");
//!     assert_eq!(conn.url.as_deref(), Some("queue://alt:6379"));
//!     assert_eq!(conn.host.as_deref(), Some("localhost"));
//!
//!     app.stop().await?;
//!     app.stop().await?; // no-op
//!     Ok(())
//! }
//! ```

pub mod config;
mod core;
mod error;
mod events;
pub mod logging;
mod workers;

// ---- Public re-exports ----

pub use config::{ConnectionConfig, SupervisorConfig, WorkerSelection};
pub use core::{
    AppHandle, Entry, ExitStatus, Loader, LoaderFn, ModuleLoader, Phase, Registry,
    ShutdownCoordinator, ShutdownTrigger, Supervisor, SupervisorBuilder, TriggerHandle,
    wait_for_shutdown_signal,
};
pub use error::{LoadError, RegistryError, RuntimeError, ShutdownError, WorkerError};
pub use events::{Bus, Event, EventKind};
pub use workers::{BoxWorkerFuture, ErrorReporter, Worker, WorkerContext, WorkerFn, WorkerRef};
