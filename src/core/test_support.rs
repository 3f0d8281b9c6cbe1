//! Scriptable worker used by the core tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::core::{Loader, Registry};
use crate::error::{LoadError, WorkerError};
use crate::workers::{BoxWorkerFuture, Worker, WorkerContext};

#[derive(Clone, Copy, Debug)]
pub(crate) enum Behavior {
    /// Runs until cancelled.
    RunForever,
    /// Never returns, even after cancellation.
    IgnoreCancel,
    /// Job loop ends right away.
    Finish,
    /// `run` returns `Err`.
    FailSync,
    /// `run` panics.
    PanicSync,
    /// Job loop future resolves to `Err`.
    RejectAsync,
    /// Reports a runtime error, then runs until cancelled.
    ReportThenRun,
    /// Runs until cancelled; `close` fails.
    FailClose,
}

#[derive(Default)]
struct ProbeState {
    runs: AtomicUsize,
    closes: AtomicUsize,
    saw_cancel: AtomicBool,
    /// Set while an `IgnoreCancel` job loop is alive; cleared when it is dropped.
    looping: AtomicBool,
}

struct LoopGuard(Arc<ProbeState>);

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.0.looping.store(false, Ordering::SeqCst);
    }
}

pub(crate) struct Probe {
    name: String,
    behavior: Behavior,
    state: Arc<ProbeState>,
}

impl Probe {
    pub(crate) fn new(name: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behavior,
            state: Arc::new(ProbeState::default()),
        })
    }

    pub(crate) fn runs(&self) -> usize {
        self.state.runs.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn saw_cancel(&self) -> bool {
        self.state.saw_cancel.load(Ordering::SeqCst)
    }

    pub(crate) fn looping(&self) -> bool {
        self.state.looping.load(Ordering::SeqCst)
    }
}

async fn until_cancelled(ctx: WorkerContext, state: Arc<ProbeState>) -> Result<(), WorkerError> {
    ctx.cancelled().await;
    state.saw_cancel.store(true, Ordering::SeqCst);
    Err(WorkerError::Canceled)
}

#[async_trait]
impl Worker for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: WorkerContext) -> Result<BoxWorkerFuture, WorkerError> {
        self.state.runs.fetch_add(1, Ordering::SeqCst);
        let state = Arc::clone(&self.state);
        match self.behavior {
            Behavior::RunForever | Behavior::FailClose => Ok(Box::pin(until_cancelled(ctx, state))),
            Behavior::IgnoreCancel => Ok(Box::pin(async move {
                let _ctx = ctx;
                state.looping.store(true, Ordering::SeqCst);
                let _guard = LoopGuard(state);
                std::future::pending::<()>().await;
                Ok::<(), WorkerError>(())
            })),
            Behavior::Finish => Ok(Box::pin(async { Ok::<(), WorkerError>(()) })),
            Behavior::FailSync => Err(WorkerError::Connection {
                error: "queue unreachable".into(),
            }),
            Behavior::PanicSync => panic!("worker {} exploded", self.name),
            Behavior::RejectAsync => Ok(Box::pin(async {
                Err::<(), WorkerError>(WorkerError::fail("job loop rejected"))
            })),
            Behavior::ReportThenRun => Ok(Box::pin(async move {
                ctx.report(WorkerError::fail("job 42 failed"));
                until_cancelled(ctx, state).await
            })),
        }
    }

    async fn close(&self) -> Result<(), WorkerError> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::FailClose => Err(WorkerError::fail("close failed")),
            _ => Ok(()),
        }
    }
}

/// Registers a fixed list of probes, in order.
pub(crate) struct ProbeLoader {
    probes: Vec<Arc<Probe>>,
}

impl ProbeLoader {
    pub(crate) fn new(probes: Vec<Arc<Probe>>) -> Self {
        Self { probes }
    }
}

#[async_trait]
impl Loader for ProbeLoader {
    fn name(&self) -> &str {
        "probes"
    }

    async fn load(&self, registry: Arc<Registry>) -> Result<(), LoadError> {
        for probe in &self.probes {
            registry.register(Arc::clone(probe) as Arc<dyn Worker>).await?;
        }
        Ok(())
    }
}
