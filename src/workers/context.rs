//! What a worker receives when it is started.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::ConnectionConfig;
use crate::error::WorkerError;

/// Creates a worker's error-notification channel.
pub(crate) fn error_channel() -> (ErrorReporter, mpsc::UnboundedReceiver<WorkerError>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ErrorReporter { tx }, rx)
}

/// Sending half of a worker's error-notification channel.
///
/// Reporting never blocks and never fails: errors sent before the supervisor
/// attached its listener are buffered, errors sent after the registry was
/// torn down are dropped.
#[derive(Clone, Debug)]
pub struct ErrorReporter {
    tx: mpsc::UnboundedSender<WorkerError>,
}

impl ErrorReporter {
    /// Reports a runtime error.
    pub fn report(&self, err: WorkerError) {
        let _ = self.tx.send(err);
    }
}

/// Runtime context handed to [`Worker::run`](crate::Worker::run).
#[derive(Clone, Debug)]
pub struct WorkerContext {
    name: Arc<str>,
    connection: Arc<ConnectionConfig>,
    token: CancellationToken,
    errors: ErrorReporter,
}

impl WorkerContext {
    pub(crate) fn new(
        name: Arc<str>,
        connection: Arc<ConnectionConfig>,
        token: CancellationToken,
        errors: ErrorReporter,
    ) -> Self {
        Self {
            name,
            connection,
            token,
            errors,
        }
    }

    /// Name of the worker this context belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared, read-only queue connection configuration.
    pub fn connection(&self) -> &Arc<ConnectionConfig> {
        &self.connection
    }

    /// Token cancelled by stop-all.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns `true` once stop-all began.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when stop-all cancels this worker.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Reports a runtime error on this worker's error channel.
    pub fn report(&self, err: WorkerError) {
        self.errors.report(err);
    }

    /// The error channel, for handing to helper tasks.
    pub fn reporter(&self) -> ErrorReporter {
        self.errors.clone()
    }
}
