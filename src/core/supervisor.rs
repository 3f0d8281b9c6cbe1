//! # Supervisor: produces a running application handle from a cold start.
//!
//! The [`Supervisor`] owns the worker [`Registry`], the module loaders, and the
//! build-time connection defaults. [`Supervisor::start`] runs the whole start
//! sequence and returns an [`AppHandle`].
//!
//! ## Start sequence
//! ```text
//! start()
//!   ├─ 1. resolve_connection(defaults, env) ─► registry.install_connection()
//!   ├─ 2. ModuleLoader::load_all(registry)        (sequential; registers workers)
//!   ├─ 3. log worker names                         ─► WorkersLoaded
//!   │        (failures in 1-3 ─► [init-failed] + InitFailed ─► stop-all of
//!   │         anything already registered ─► Err to caller)
//!   ├─ 4. attach_error_listener(w) for EVERY worker
//!   ├─ 5. start(w) for every worker                (non-blocking; failures isolated)
//!   │        ├─ Ok       ─► job loop spawned, watched by monitor
//!   │        └─ Err      ─► [worker-start-failed] + WorkerStartFailed, continue
//!   └─ 6. AppHandle { stop(), workers }
//! ```
//!
//! ## Rules
//! - The connection is installed before any loader runs.
//! - Every error listener is attached before any worker starts.
//! - A worker failing to start never prevents its siblings from starting.
//! - `start` does not wait for any job loop.
//!
//! ## Example
//! ```rust
//! use jobvisor::{ConnectionConfig, LoadError, LoaderFn, Registry, Supervisor, WorkerContext, WorkerError, WorkerFn};
//! use jobvisor::config::MapEnv;
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::builder(ConnectionConfig::default())
//!         .with_env(MapEnv::new())
//!         .with_loader(LoaderFn::new("mail", |registry: Arc<Registry>| async move {
//!             registry
//!                 .register(WorkerFn::arc("mailer", |ctx: WorkerContext| async move {
//!                     ctx.cancelled().await;
//!                     Ok::<(), WorkerError>(())
//!                 }))
//!                 .await?;
//!             Ok::<(), LoadError>(())
//!         }))
//!         .build();
//!
//!     let app = sup.start().await?;
//!     assert_eq!(app.workers(), ["mailer"]);
//!     app.stop().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::config::{ConnectionConfig, EnvSource, resolve_connection};
use crate::core::{AppHandle, ModuleLoader, Registry, SupervisorBuilder, monitor};
use crate::error::{RegistryError, RuntimeError};
use crate::events::{Bus, Event, EventKind};

/// Coordinates connection setup, module loading, and worker start.
pub struct Supervisor {
    defaults: ConnectionConfig,
    env: Box<dyn EnvSource + Send + Sync>,
    loader: ModuleLoader,
    registry: Arc<Registry>,
    bus: Bus,
}

impl Supervisor {
    /// Returns a builder seeded with the build-time connection defaults.
    pub fn builder(defaults: ConnectionConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(defaults)
    }

    pub(crate) fn new_internal(
        defaults: ConnectionConfig,
        env: Box<dyn EnvSource + Send + Sync>,
        loader: ModuleLoader,
        registry: Arc<Registry>,
        bus: Bus,
    ) -> Self {
        Self {
            defaults,
            env,
            loader,
            registry,
            bus,
        }
    }

    /// The registry populated by this supervisor.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Subscribes to runtime events. Subscribe before `start` to observe the whole sequence.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Runs the start sequence and returns a handle to the running workers.
    ///
    /// Initialization failures (connection install, module loading) are logged
    /// and returned; nothing was started in that case. Per-worker start
    /// failures are logged only.
    pub async fn start(&self) -> Result<AppHandle, RuntimeError> {
        let names = match self.initialize().await {
            Ok(names) => names,
            Err(err) => {
                error!(label = err.as_label(), "[init-failed] {err}");
                self.bus
                    .publish(Event::new(EventKind::InitFailed).with_reason(err.to_string()));
                // A repeated start must leave the first start's workers running.
                if !matches!(
                    err,
                    RuntimeError::Registry(RegistryError::ConnectionAlreadyInstalled)
                ) {
                    self.release_partial().await;
                }
                return Err(err);
            }
        };

        self.attach_listeners(&names).await;
        self.start_workers(&names).await;
        self.registry.seal();

        Ok(AppHandle::new(
            Arc::clone(&self.registry),
            self.bus.clone(),
            names,
        ))
    }

    /// Steps 1-3: connection, modules, worker list.
    async fn initialize(&self) -> Result<Vec<String>, RuntimeError> {
        let connection = resolve_connection(&self.defaults, &*self.env);
        self.registry.install_connection(connection)?;

        self.loader.load_all(&self.registry).await?;

        if self.registry.is_empty().await {
            warn!("[workers-loaded] no workers registered");
        }
        let names = self.registry.names().await;
        info!(count = names.len(), workers = ?names, "[workers-loaded]");
        self.bus
            .publish(Event::new(EventKind::WorkersLoaded).with_count(names.len()));
        Ok(names)
    }

    /// Tears down whatever earlier loaders registered before init failed.
    async fn release_partial(&self) {
        if let Err(err) = self.registry.stop_all().await {
            error!(label = err.as_label(), "[stop-failed] releasing partially loaded workers: {err}");
        }
    }

    async fn attach_listeners(&self, names: &[String]) {
        for name in names {
            if let Err(err) = self.registry.attach_error_listener(name).await {
                error!(worker = %name, label = err.as_label(), "[worker-error] cannot attach error listener: {err}");
            }
        }
    }

    async fn start_workers(&self, names: &[String]) {
        for name in names {
            match self.registry.start(name).await {
                Ok(()) => {}
                Err(RuntimeError::WorkerStart { error, .. }) => {
                    monitor::report_start_failure(&self.bus, &Arc::from(name.as_str()), error);
                }
                Err(other) => {
                    monitor::report_start_failure(&self.bus, &Arc::from(name.as_str()), other.to_string());
                }
            }
        }
    }
}
