//! # Worker registry - explicitly constructed worker store with its own teardown.
//!
//! The registry holds worker instances in registration order and owns their
//! runtime handles. It is created once per supervisor and passed by reference.
//!
//! ## Lifecycle
//! ```text
//! install_connection(cfg)           (exactly once, before any register)
//!        │
//! register(worker) × N              (sequential, during module loading)
//!        │                          (no auto-start)
//! attach_error_listener(name) × N   (all listeners before any start)
//!        │
//! start(name) × N                   (at most once per worker; spawns job loop)
//!        │
//! seal()                            (closed() may now complete)
//!        │
//! stop_all()                        (idempotent: cancel → join within grace → close())
//! ```
//!
//! ## Rules
//! - Registration order is preserved and is the order of [`Registry::names`].
//! - Each worker is started at most once; each worker is closed exactly once.
//! - `stop_all` runs the teardown body once; later and concurrent callers observe the same result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tokio::sync::{RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::config::{ConnectionConfig, SupervisorConfig, WorkerSelection};
use crate::core::monitor::{self, panic_message};
use crate::error::{RegistryError, RuntimeError, ShutdownError, WorkerError};
use crate::events::{Bus, Event, EventKind};
use crate::workers::{ErrorReporter, WorkerContext, WorkerRef, error_channel};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One registered worker and its runtime handles.
struct Slot {
    name: Arc<str>,
    worker: WorkerRef,
    /// Child of the registry runtime token.
    token: CancellationToken,
    /// Sending half of the error channel; moves into the context on start.
    reporter: Mutex<Option<ErrorReporter>>,
    /// Receiving half; taken by `attach_error_listener`.
    errors: Mutex<Option<mpsc::UnboundedReceiver<WorkerError>>>,
    /// Job-loop task; present once started.
    join: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
}

/// Registry of workers for one supervisor.
pub struct Registry {
    cfg: SupervisorConfig,
    bus: Bus,
    selection: WorkerSelection,
    connection: OnceLock<Arc<ConnectionConfig>>,
    slots: RwLock<Vec<Arc<Slot>>>,
    runtime_token: CancellationToken,
    tracker: TaskTracker,
    /// Outcome of the teardown task; set by the first stop-all caller.
    stopped: OnceLock<watch::Receiver<Option<Result<(), ShutdownError>>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new(cfg: SupervisorConfig, bus: Bus, selection: WorkerSelection) -> Arc<Self> {
        Arc::new(Self {
            cfg,
            bus,
            selection,
            connection: OnceLock::new(),
            slots: RwLock::new(Vec::new()),
            runtime_token: CancellationToken::new(),
            tracker: TaskTracker::new(),
            stopped: OnceLock::new(),
        })
    }

    /// Installs the shared connection configuration. Callable once.
    pub fn install_connection(&self, cfg: ConnectionConfig) -> Result<(), RegistryError> {
        let target = cfg.target();
        self.connection
            .set(Arc::new(cfg))
            .map_err(|_| RegistryError::ConnectionAlreadyInstalled)?;
        info!(target_addr = %target, "connection installed");
        self.bus
            .publish(Event::new(EventKind::ConnectionInstalled).with_reason(target));
        Ok(())
    }

    /// Returns the installed connection configuration, if any.
    pub fn connection(&self) -> Option<Arc<ConnectionConfig>> {
        self.connection.get().cloned()
    }

    /// Adds a worker to the registry without starting it.
    ///
    /// Workers filtered out by the include/exclude selection are skipped (not an error).
    pub async fn register(&self, worker: WorkerRef) -> Result<(), RegistryError> {
        let name: Arc<str> = Arc::from(worker.name());

        if self.connection.get().is_none() {
            return Err(RegistryError::ConnectionNotInstalled {
                worker: name.to_string(),
            });
        }
        if self.stopped.get().is_some() || self.runtime_token.is_cancelled() {
            return Err(RegistryError::Stopped);
        }
        if !self.selection.allows(&name) {
            debug!(worker = %name, "worker skipped by selection");
            self.bus
                .publish(Event::new(EventKind::WorkerSkipped).with_worker(name));
            return Ok(());
        }

        let mut slots = self.slots.write().await;
        if slots.iter().any(|s| s.name == name) {
            return Err(RegistryError::DuplicateWorker {
                name: name.to_string(),
            });
        }

        let (reporter, errors) = error_channel();
        slots.push(Arc::new(Slot {
            name: Arc::clone(&name),
            worker,
            token: self.runtime_token.child_token(),
            reporter: Mutex::new(Some(reporter)),
            errors: Mutex::new(Some(errors)),
            join: Mutex::new(None),
            started: AtomicBool::new(false),
        }));
        drop(slots);

        debug!(worker = %name, "worker registered");
        self.bus
            .publish(Event::new(EventKind::WorkerRegistered).with_worker(name));
        Ok(())
    }

    /// Returns worker names in registration order.
    pub async fn names(&self) -> Vec<String> {
        let slots = self.slots.read().await;
        slots.iter().map(|s| s.name.to_string()).collect()
    }

    /// Returns true if no worker is registered.
    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }

    /// Attaches the error listener of `name`: its runtime errors are logged and published.
    pub async fn attach_error_listener(&self, name: &str) -> Result<(), RegistryError> {
        let slot = self.slot(name).await?;
        let rx = lock(&slot.errors)
            .take()
            .ok_or_else(|| RegistryError::ListenerAlreadyAttached {
                name: name.to_string(),
            })?;
        monitor::spawn_error_listener(self.bus.clone(), Arc::clone(&slot.name), rx);
        Ok(())
    }

    /// Starts worker `name` without waiting for its job loop.
    ///
    /// Returns [`RuntimeError::WorkerStart`] if the worker's run operation fails
    /// synchronously (error or panic). Failures of the job loop itself are
    /// observed by a monitor task and never returned here.
    pub async fn start(&self, name: &str) -> Result<(), RuntimeError> {
        let slot = self.slot(name).await?;
        if self.runtime_token.is_cancelled() {
            return Err(RegistryError::Stopped.into());
        }
        if slot.started.swap(true, Ordering::AcqRel) {
            return Err(RegistryError::AlreadyStarted {
                name: name.to_string(),
            }
            .into());
        }

        let connection = self
            .connection()
            .ok_or_else(|| RegistryError::ConnectionNotInstalled {
                worker: name.to_string(),
            })?;
        let reporter = lock(&slot.reporter)
            .take()
            .ok_or(RegistryError::Stopped)?;

        let ctx = WorkerContext::new(
            Arc::clone(&slot.name),
            connection,
            slot.token.clone(),
            reporter,
        );

        self.bus
            .publish(Event::new(EventKind::WorkerStarting).with_worker(Arc::clone(&slot.name)));

        let worker = Arc::clone(&slot.worker);
        let fut = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| worker.run(ctx))) {
            Ok(Ok(fut)) => fut,
            Ok(Err(err)) => {
                return Err(RuntimeError::WorkerStart {
                    worker: name.to_string(),
                    error: err.to_string(),
                });
            }
            Err(panic) => {
                return Err(RuntimeError::WorkerStart {
                    worker: name.to_string(),
                    error: format!("panicked: {}", panic_message(&*panic)),
                });
            }
        };

        let join = self.tracker.spawn(monitor::watch_run(
            self.bus.clone(),
            Arc::clone(&slot.name),
            fut,
        ));
        *lock(&slot.join) = Some(join);
        debug!(worker = %name, "worker started");
        Ok(())
    }

    /// Marks the end of the start phase; [`Registry::closed`] may complete afterwards.
    pub fn seal(&self) {
        self.tracker.close();
    }

    /// Completes once sealed and every started job loop has finished.
    pub async fn closed(&self) {
        self.tracker.wait().await;
    }

    /// Stops every worker. Idempotent: the teardown body runs once.
    ///
    /// Teardown runs in its own task, so dropping a pending call (for example
    /// under a timeout) never interrupts it; later calls await the same outcome.
    pub async fn stop_all(self: &Arc<Self>) -> Result<(), ShutdownError> {
        let mut outcome = self
            .stopped
            .get_or_init(|| {
                let (tx, rx) = watch::channel(None);
                let registry = Arc::clone(self);
                tokio::spawn(async move {
                    let res = registry.teardown().await;
                    let _ = tx.send(Some(res));
                });
                rx
            })
            .clone();

        match outcome.wait_for(Option::is_some).await {
            Ok(done) => (*done).clone().unwrap_or(Ok(())),
            Err(_) => Err(ShutdownError::Join {
                worker: "<registry>".to_string(),
                error: "teardown task ended without a result".to_string(),
            }),
        }
    }

    /// Returns true once stop-all has completed.
    pub fn is_stopped(&self) -> bool {
        self.stopped
            .get()
            .is_some_and(|outcome| outcome.borrow().is_some())
    }

    async fn teardown(&self) -> Result<(), ShutdownError> {
        self.runtime_token.cancel();
        self.tracker.close();

        let slots: Vec<Arc<Slot>> = self.slots.read().await.clone();
        let mut failure: Option<ShutdownError> = None;

        let stuck = self.join_within_grace(&slots, &mut failure).await;
        if !stuck.is_empty() {
            if let Some(grace) = self.cfg.stop_grace_limit() {
                warn!(stuck = ?stuck, ?grace, "[stop-failed] stop grace exceeded; aborting workers");
                self.bus
                    .publish(Event::new(EventKind::GraceExceeded).with_count(stuck.len()));
                failure = Some(ShutdownError::GraceExceeded { grace, stuck });
            }
        }

        for slot in &slots {
            // Never-started workers still hold their reporter; dropping it ends the listener.
            lock(&slot.reporter).take();

            if let Err(err) = slot.worker.close().await {
                error!(worker = %slot.name, error = %err, "[stop-failed] worker close failed");
                failure.get_or_insert(ShutdownError::WorkerClose {
                    worker: slot.name.to_string(),
                    error: err.to_string(),
                });
            }
        }

        match &failure {
            None => self.bus.publish(Event::new(EventKind::StopCompleted)),
            Some(err) => self
                .bus
                .publish(Event::new(EventKind::StopFailed).with_reason(err.to_string())),
        }
        failure.map_or(Ok(()), Err)
    }

    /// Joins every started job loop, aborting those still running after the grace period.
    /// Returns the names of aborted workers.
    async fn join_within_grace(
        &self,
        slots: &[Arc<Slot>],
        failure: &mut Option<ShutdownError>,
    ) -> Vec<String> {
        let deadline = self
            .cfg
            .stop_grace_limit()
            .map(|grace| time::Instant::now() + grace);
        let mut stuck = Vec::new();

        for slot in slots {
            let Some(mut join) = lock(&slot.join).take() else {
                continue;
            };
            let joined = match deadline {
                Some(deadline) => match time::timeout_at(deadline, &mut join).await {
                    Ok(res) => Some(res),
                    Err(_elapsed) => {
                        join.abort();
                        // close() must not run while the aborted loop is still alive.
                        let _ = (&mut join).await;
                        stuck.push(slot.name.to_string());
                        None
                    }
                },
                None => Some((&mut join).await),
            };
            if let Some(Err(join_err)) = joined {
                let error = match join_err.try_into_panic() {
                    Ok(panic) => panic_message(&*panic),
                    Err(join_err) => join_err.to_string(),
                };
                failure.get_or_insert(ShutdownError::Join {
                    worker: slot.name.to_string(),
                    error,
                });
            }
        }
        stuck
    }

    async fn slot(&self, name: &str) -> Result<Arc<Slot>, RegistryError> {
        let slots = self.slots.read().await;
        slots
            .iter()
            .find(|s| &*s.name == name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownWorker {
                name: name.to_string(),
            })
    }
}
