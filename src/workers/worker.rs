//! # Worker abstraction.
//!
//! A [`Worker`] consumes jobs from the shared queue until stopped. Starting is
//! split in two so the supervisor can tell failures apart:
//! - [`Worker::run`] is the **synchronous** part: it may fail immediately
//!   (bad arguments, missing connection) by returning `Err`.
//! - The returned future is the job loop; it is spawned as its own task and
//!   is expected to run until the [`WorkerContext`] token is cancelled.
//!
//! Errors that do not end the job loop (a single job failing, a reconnect)
//! go through [`WorkerContext::report`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::WorkerError;
use crate::workers::WorkerContext;

/// Boxed job-loop future returned by [`Worker::run`].
pub type BoxWorkerFuture = Pin<Box<dyn Future<Output = Result<(), WorkerError>> + Send + 'static>>;

/// Shared handle to a worker.
pub type WorkerRef = Arc<dyn Worker>;

/// # Long-running queue consumer.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use jobvisor::{BoxWorkerFuture, Worker, WorkerContext, WorkerError};
///
/// struct Mailer;
///
/// #[async_trait]
/// impl Worker for Mailer {
///     fn name(&self) -> &str { "mailer" }
///
///     fn run(&self, ctx: WorkerContext) -> Result<BoxWorkerFuture, WorkerError> {
///         Ok(Box::pin(async move {
///             ctx.cancelled().await;
///             Ok::<(), WorkerError>(())
///         }))
///     }
/// }
/// ```
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// Returns a stable, human-readable worker name (unique within a registry).
    fn name(&self) -> &str;

    /// Starts the worker without blocking.
    ///
    /// Returns the job loop as a future; the caller spawns it.
    fn run(&self, ctx: WorkerContext) -> Result<BoxWorkerFuture, WorkerError>;

    /// Releases worker resources. Called exactly once by stop-all, after the job loop finished.
    async fn close(&self) -> Result<(), WorkerError> {
        Ok(())
    }
}
