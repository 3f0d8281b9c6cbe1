//! # Worker abstractions.
//!
//! This module provides the worker-side contract of the registry:
//! - [`Worker`] - trait for long-running queue consumers
//! - [`WorkerFn`] - closure-backed worker implementation
//! - [`WorkerRef`] - shared reference to a worker (`Arc<dyn Worker>`)
//! - [`WorkerContext`] - what a worker receives when started
//! - [`ErrorReporter`] - the worker's error-notification channel

mod context;
mod worker;
mod worker_fn;

pub use context::{ErrorReporter, WorkerContext};
pub(crate) use context::error_channel;
pub use worker::{BoxWorkerFuture, Worker, WorkerRef};
pub use worker_fn::WorkerFn;
