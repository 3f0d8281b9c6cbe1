//! # Runtime events emitted by the supervisor, registry and shutdown coordinator.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Initialization events**: connection install, registration, module loading
//! - **Worker events**: start attempts, start failures, runtime errors, exits
//! - **Shutdown events**: stop requested, stop completed/failed, grace exceeded
//!
//! The [`Event`] struct carries additional metadata such as timestamps, worker
//! name and failure reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use jobvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::WorkerError)
//!     .with_worker("mailer")
//!     .with_reason("smtp timeout");
//!
//! assert_eq!(ev.kind, EventKind::WorkerError);
//! assert_eq!(ev.worker.as_deref(), Some("mailer"));
//! assert_eq!(ev.reason.as_deref(), Some("smtp timeout"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Initialization events ===
    /// Resolved connection configuration was installed into the registry.
    ///
    /// Sets:
    /// - `reason`: connection target (credentials redacted)
    ConnectionInstalled,

    /// A worker was added to the registry.
    ///
    /// Sets:
    /// - `worker`: worker name
    WorkerRegistered,

    /// A worker was filtered out by the include/exclude selection.
    ///
    /// Sets:
    /// - `worker`: worker name
    WorkerSkipped,

    /// All module loaders completed.
    ///
    /// Sets:
    /// - `count`: number of registered workers
    WorkersLoaded,

    /// Initialization failed before any worker started.
    ///
    /// Sets:
    /// - `reason`: failure message
    InitFailed,

    // === Worker events ===
    /// Supervisor is invoking a worker's run operation.
    ///
    /// Sets:
    /// - `worker`: worker name
    WorkerStarting,

    /// A worker's run operation failed synchronously or its future rejected.
    ///
    /// Sets:
    /// - `worker`: worker name
    /// - `reason`: failure message
    WorkerStartFailed,

    /// A running worker reported an error on its error channel.
    ///
    /// Sets:
    /// - `worker`: worker name
    /// - `reason`: failure message
    WorkerError,

    /// A worker's run future finished (normally or by cancellation).
    ///
    /// Sets:
    /// - `worker`: worker name
    WorkerExited,

    // === Shutdown events ===
    /// Shutdown was triggered (signal, natural exit, or explicit trigger).
    ///
    /// Sets:
    /// - `reason`: trigger description
    ShutdownRequested,

    /// Stop-all finished; every worker was torn down.
    StopCompleted,

    /// Stop-all finished with an error.
    ///
    /// Sets:
    /// - `reason`: failure message
    StopFailed,

    /// Stop grace period exceeded; stragglers were aborted.
    ///
    /// Sets:
    /// - `count`: number of aborted workers
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the worker, if applicable.
    pub worker: Option<Arc<str>>,
    /// Human-readable reason (errors, trigger details, etc.).
    pub reason: Option<Arc<str>>,
    /// Count (workers loaded, workers aborted).
    pub count: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            reason: None,
            count: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a worker name.
    #[inline]
    pub fn with_worker(mut self, worker: impl Into<Arc<str>>) -> Self {
        self.worker = Some(worker.into());
        self
    }

    /// Attaches a count.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }
}
