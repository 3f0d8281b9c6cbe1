//! Error types used by the jobvisor runtime, the registry and workers.
//!
//! This module defines the error taxonomy of the crate:
//!
//! - [`RuntimeError`] - failures surfaced by the supervisor (module loading,
//!   worker start, worker runtime errors, shutdown).
//! - [`RegistryError`] - contract violations against the worker [`Registry`](crate::Registry).
//! - [`LoadError`] - failures returned by a worker-definition loader.
//! - [`ShutdownError`] - failures of the stop-all sequence.
//! - [`WorkerError`] - errors raised by individual workers.
//!
//! Every enum provides `as_label` (a short stable snake_case label) for logs.

use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the jobvisor runtime.
///
/// Per-worker variants ([`WorkerStart`](RuntimeError::WorkerStart),
/// [`WorkerRuntime`](RuntimeError::WorkerRuntime)) are only ever logged and
/// published on the bus; they never propagate to the caller of
/// [`Supervisor::start`](crate::Supervisor::start).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A worker-definition loader failed; remaining loaders were not run.
    #[error("module loader {loader:?} failed: {source}")]
    ModuleLoad {
        /// Name of the failing loader.
        loader: String,
        /// Underlying loader failure.
        #[source]
        source: LoadError,
    },

    /// The registry rejected an operation during initialization.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A worker's run operation failed synchronously or its future rejected.
    #[error("worker {worker:?} failed to start: {error}")]
    WorkerStart {
        /// Worker name.
        worker: String,
        /// Failure message.
        error: String,
    },

    /// A worker reported an error on its error channel after starting.
    #[error("worker {worker:?} reported an error: {error}")]
    WorkerRuntime {
        /// Worker name.
        worker: String,
        /// Failure message.
        error: String,
    },

    /// The stop-all operation failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),

    /// The start sequence was aborted (panicked or cancelled) before producing a handle.
    #[error("start aborted: {reason}")]
    StartAborted {
        /// Human-readable reason.
        reason: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use jobvisor::RuntimeError;
    ///
    /// let err = RuntimeError::WorkerStart { worker: "mailer".into(), error: "boom".into() };
    /// assert_eq!(err.as_label(), "worker_start_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::ModuleLoad { .. } => "module_load_failed",
            RuntimeError::Registry(_) => "registry_error",
            RuntimeError::WorkerStart { .. } => "worker_start_failed",
            RuntimeError::WorkerRuntime { .. } => "worker_runtime_error",
            RuntimeError::Shutdown(_) => "shutdown_failed",
            RuntimeError::StartAborted { .. } => "start_aborted",
        }
    }
}

/// # Contract violations against the worker registry.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// `install_connection` was called more than once.
    #[error("connection already installed")]
    ConnectionAlreadyInstalled,

    /// A worker was registered before the connection was installed.
    #[error("worker {worker:?} registered before the connection was installed")]
    ConnectionNotInstalled {
        /// Worker name.
        worker: String,
    },

    /// Another worker with the same name is already registered.
    #[error("worker {name:?} already registered")]
    DuplicateWorker {
        /// Worker name.
        name: String,
    },

    /// No worker with this name is registered.
    #[error("worker {name:?} not found")]
    UnknownWorker {
        /// Worker name.
        name: String,
    },

    /// The error listener of this worker has already been taken.
    #[error("error listener for worker {name:?} already attached")]
    ListenerAlreadyAttached {
        /// Worker name.
        name: String,
    },

    /// The worker was already started once in this process.
    #[error("worker {name:?} already started")]
    AlreadyStarted {
        /// Worker name.
        name: String,
    },

    /// The registry is stopping or stopped; no new work is accepted.
    #[error("registry is stopped")]
    Stopped,
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::ConnectionAlreadyInstalled => "connection_already_installed",
            RegistryError::ConnectionNotInstalled { .. } => "connection_not_installed",
            RegistryError::DuplicateWorker { .. } => "duplicate_worker",
            RegistryError::UnknownWorker { .. } => "unknown_worker",
            RegistryError::ListenerAlreadyAttached { .. } => "listener_already_attached",
            RegistryError::AlreadyStarted { .. } => "worker_already_started",
            RegistryError::Stopped => "registry_stopped",
        }
    }
}

/// # Failure returned by a worker-definition loader.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LoadError {
    /// The registry rejected a registration made by the loader.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The loader itself failed.
    #[error("{error}")]
    Fail {
        /// Failure message.
        error: String,
    },
}

impl LoadError {
    /// Convenience constructor for [`LoadError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        LoadError::Fail {
            error: error.into(),
        }
    }
}

/// # Failures of the stop-all sequence.
///
/// `Clone` so that every caller of an idempotent `stop()` observes the same outcome.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShutdownError {
    /// Some workers did not finish within the configured grace period and were aborted.
    #[error("stop grace {grace:?} exceeded; stuck: {stuck:?}; aborting")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of workers that did not stop in time.
        stuck: Vec<String>,
    },

    /// A worker's close hook failed.
    #[error("worker {worker:?} failed to close: {error}")]
    WorkerClose {
        /// Worker name.
        worker: String,
        /// Failure message.
        error: String,
    },

    /// A worker's run task panicked while being stopped.
    #[error("worker {worker:?} panicked during stop: {error}")]
    Join {
        /// Worker name.
        worker: String,
        /// Panic message.
        error: String,
    },
}

impl ShutdownError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ShutdownError::GraceExceeded { .. } => "stop_grace_exceeded",
            ShutdownError::WorkerClose { .. } => "worker_close_failed",
            ShutdownError::Join { .. } => "worker_join_failed",
        }
    }
}

/// # Errors produced by workers.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// Job processing failed.
    #[error("execution failed: {error}")]
    Fail {
        /// Failure message.
        error: String,
    },

    /// The queue backend could not be reached.
    #[error("connection error: {error}")]
    Connection {
        /// Failure message.
        error: String,
    },

    /// The worker observed the stop-all cancellation.
    #[error("context cancelled")]
    Canceled,
}

impl WorkerError {
    /// Convenience constructor for [`WorkerError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        WorkerError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use jobvisor::WorkerError;
    ///
    /// assert_eq!(WorkerError::Canceled.as_label(), "worker_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Fail { .. } => "worker_failed",
            WorkerError::Connection { .. } => "worker_connection_error",
            WorkerError::Canceled => "worker_canceled",
        }
    }
}
