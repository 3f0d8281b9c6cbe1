//! # Per-worker monitor routines.
//!
//! Two routines observe every worker so that no failure goes unobserved:
//!
//! ```text
//! ErrorReporter ──► [unbounded queue] ──► error_listener ──► warn! + WorkerError event
//!
//! Worker::run() ──► job-loop future ──► watch_run ──► Ok / Canceled   ──► WorkerExited
//!                                                   ├► Err(e)          ──► error! + WorkerStartFailed
//!                                                   └► panic           ──► error! + WorkerStartFailed
//! ```
//!
//! ## Rules
//! - Nothing here propagates: failures are logged and published, never rethrown.
//! - The error listener ends once every [`ErrorReporter`](crate::ErrorReporter) clone is dropped.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::{RuntimeError, WorkerError};
use crate::events::{Bus, Event, EventKind};
use crate::workers::BoxWorkerFuture;

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Spawns the error listener for one worker.
pub(crate) fn spawn_error_listener(
    bus: Bus,
    name: Arc<str>,
    mut rx: mpsc::UnboundedReceiver<WorkerError>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(err) = rx.recv().await {
            report_runtime_error(&bus, &name, &err);
        }
        debug!(worker = %name, "error channel closed");
    })
}

fn report_runtime_error(bus: &Bus, name: &Arc<str>, err: &WorkerError) {
    let failure = RuntimeError::WorkerRuntime {
        worker: name.to_string(),
        error: err.to_string(),
    };
    warn!(
        worker = %name,
        label = err.as_label(),
        error = %err,
        "[worker-error] {failure}"
    );
    bus.publish(
        Event::new(EventKind::WorkerError)
            .with_worker(Arc::clone(name))
            .with_reason(err.to_string()),
    );
}

/// Drives a worker's job loop to completion and reports how it ended.
pub(crate) async fn watch_run(bus: Bus, name: Arc<str>, fut: BoxWorkerFuture) {
    let failure = match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) | Ok(Err(WorkerError::Canceled)) => None,
        Ok(Err(err)) => Some(err.to_string()),
        Err(panic) => Some(format!("panicked: {}", panic_message(&*panic))),
    };

    match failure {
        None => {
            debug!(worker = %name, "[worker-exited]");
            bus.publish(Event::new(EventKind::WorkerExited).with_worker(name));
        }
        Some(error) => {
            report_start_failure(&bus, &name, error);
            bus.publish(Event::new(EventKind::WorkerExited).with_worker(name));
        }
    }
}

/// Logs and publishes a start failure (synchronous or from the job-loop future).
pub(crate) fn report_start_failure(bus: &Bus, name: &Arc<str>, error: String) {
    let failure = RuntimeError::WorkerStart {
        worker: name.to_string(),
        error: error.clone(),
    };
    error!(worker = %name, label = failure.as_label(), "[worker-start-failed] {failure}");
    bus.publish(
        Event::new(EventKind::WorkerStartFailed)
            .with_worker(Arc::clone(name))
            .with_reason(error),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;

    fn boxed<F>(fut: F) -> BoxWorkerFuture
    where
        F: Future<Output = Result<(), WorkerError>> + Send + 'static,
    {
        Box::pin(fut)
    }

    #[test]
    fn test_panic_message_shapes() {
        let a: Box<dyn Any + Send> = Box::new("static");
        let b: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let c: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(&*a), "static");
        assert_eq!(panic_message(&*b), "owned");
        assert_eq!(panic_message(&*c), "unknown panic");
    }

    #[tokio::test]
    async fn test_error_listener_publishes_and_ends_on_close() {
        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = spawn_error_listener(bus.clone(), Arc::from("mailer"), rx);

        tx.send(WorkerError::fail("smtp down")).unwrap();
        drop(tx);
        listener.await.unwrap();

        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::WorkerError);
        assert_eq!(ev.worker.as_deref(), Some("mailer"));
        assert_eq!(ev.reason.as_deref(), Some("execution failed: smtp down"));
    }

    #[tokio::test]
    async fn test_watch_run_reports_rejection_and_panic() {
        let bus = Bus::new(16);
        let mut events = bus.subscribe();

        watch_run(
            bus.clone(),
            Arc::from("a"),
            boxed(async { Err::<(), WorkerError>(WorkerError::fail("bad queue")) }),
        )
        .await;
        watch_run(
            bus.clone(),
            Arc::from("b"),
            boxed(async {
                if true {
                    panic!("boom");
                }
                Ok::<(), WorkerError>(())
            }),
        )
        .await;
        watch_run(
            bus.clone(),
            Arc::from("c"),
            boxed(async { Err::<(), WorkerError>(WorkerError::Canceled) }),
        )
        .await;

        let kinds: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| (e.kind, e.worker.as_deref().map(str::to_string)))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (EventKind::WorkerStartFailed, Some("a".into())),
                (EventKind::WorkerExited, Some("a".into())),
                (EventKind::WorkerStartFailed, Some("b".into())),
                (EventKind::WorkerExited, Some("b".into())),
                (EventKind::WorkerExited, Some("c".into())),
            ]
        );
    }
}
