//! # Shutdown coordination: run the stop sequence exactly once.
//!
//! [`ShutdownCoordinator`] drives the process-level lifecycle around a pending
//! start. Termination triggers from several producers are funnelled into one
//! channel whose single consumer runs the teardown body once.
//!
//! ## States
//! ```text
//! Init ──run()──► Starting ──start ok──► Running
//!                    │                      │
//!                    └──────trigger─────────┴──► Stopping ──► Stopped
//! ```
//!
//! ## Trigger producers
//! ```text
//! OS signal listener ─┐
//! natural exit       ─┼──► [trigger channel] ──► consumer ──► teardown (once)
//! TriggerHandle      ─┘                              └──► later triggers: logged, ignored
//! ```
//! Natural exit fires when the start failed, or when every started worker's
//! job loop has finished.
//!
//! ## Teardown
//! 1. await the pending start (never acts on a partial state; a failed or
//!    aborted start does not hang)
//! 2. log the worker names being closed
//! 3. `AppHandle::stop()`
//! 4. log completion; return [`ExitStatus::Success`] even if stop failed

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::core::monitor::panic_message;
use crate::core::{AppHandle, signals};
use crate::error::RuntimeError;
use crate::events::{Event, EventKind};

type StartOutcome = Result<AppHandle, Arc<RuntimeError>>;

/// Lifecycle phase of a coordinated process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// Why shutdown was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// A termination signal was received.
    Signal,
    /// Nothing is left running (or start failed).
    NaturalExit,
    /// The host asked for shutdown.
    Requested(String),
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownTrigger::Signal => f.write_str("signal"),
            ShutdownTrigger::NaturalExit => f.write_str("natural-exit"),
            ShutdownTrigger::Requested(reason) => write!(f, "requested: {reason}"),
        }
    }
}

/// Process exit status produced by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl ExitStatus {
    /// Numeric exit code.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => std::process::ExitCode::SUCCESS,
            ExitStatus::Failure => std::process::ExitCode::FAILURE,
        }
    }
}

/// Producer side of the trigger channel.
#[derive(Clone, Debug)]
pub struct TriggerHandle {
    tx: mpsc::UnboundedSender<ShutdownTrigger>,
}

impl TriggerHandle {
    /// Requests shutdown. Repeated requests are harmless.
    pub fn trigger(&self, trigger: ShutdownTrigger) {
        let _ = self.tx.send(trigger);
    }
}

/// Runs a start future and tears the application down exactly once on the first trigger.
pub struct ShutdownCoordinator {
    phase: Arc<watch::Sender<Phase>>,
    tx: mpsc::UnboundedSender<ShutdownTrigger>,
    rx: mpsc::UnboundedReceiver<ShutdownTrigger>,
    signals: bool,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    /// Creates a coordinator that listens for OS termination signals.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            phase: Arc::new(watch::Sender::new(Phase::Init)),
            tx,
            rx,
            signals: true,
        }
    }

    /// Disables the OS signal producer (hosts that own signal handling, tests).
    pub fn without_signals(mut self) -> Self {
        self.signals = false;
        self
    }

    /// Returns a producer handle for the trigger channel.
    pub fn trigger_handle(&self) -> TriggerHandle {
        TriggerHandle {
            tx: self.tx.clone(),
        }
    }

    /// Observes phase transitions.
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Starts the application and returns once it was torn down.
    ///
    /// `start` runs concurrently with trigger handling; a trigger that arrives
    /// first waits for it to settle.
    pub async fn run<F>(self, start: F) -> ExitStatus
    where
        F: Future<Output = Result<AppHandle, RuntimeError>> + Send + 'static,
    {
        let Self {
            phase,
            tx,
            mut rx,
            signals,
        } = self;

        phase.send_replace(Phase::Starting);
        let outcome = spawn_start(start, Arc::clone(&phase), tx.clone());

        let signal_task = signals.then(|| spawn_signal_listener(tx.clone()));
        drop(tx);

        let first = rx.recv().await.unwrap_or(ShutdownTrigger::NaturalExit);
        phase.send_replace(Phase::Stopping);
        info!(trigger = %first, "[shutdown] shutdown requested");

        let teardown = teardown(first, outcome);
        tokio::pin!(teardown);
        let status = loop {
            tokio::select! {
                status = &mut teardown => break status,
                Some(again) = rx.recv() => {
                    debug!(trigger = %again, "[shutdown] already stopping; trigger ignored");
                }
            }
        };

        if let Some(task) = signal_task {
            task.abort();
        }
        phase.send_replace(Phase::Stopped);
        status
    }
}

/// Spawns the start future; its outcome is published once it settles.
fn spawn_start<F>(
    start: F,
    phase: Arc<watch::Sender<Phase>>,
    tx: mpsc::UnboundedSender<ShutdownTrigger>,
) -> watch::Receiver<Option<StartOutcome>>
where
    F: Future<Output = Result<AppHandle, RuntimeError>> + Send + 'static,
{
    let (outcome_tx, outcome_rx) = watch::channel(None);

    tokio::spawn(async move {
        let outcome: StartOutcome = match AssertUnwindSafe(start).catch_unwind().await {
            Ok(Ok(app)) => Ok(app),
            Ok(Err(err)) => Err(Arc::new(err)),
            Err(panic) => Err(Arc::new(RuntimeError::StartAborted {
                reason: panic_message(&*panic),
            })),
        };

        match &outcome {
            Ok(app) => {
                phase.send_if_modified(|p| {
                    if *p == Phase::Starting {
                        *p = Phase::Running;
                        true
                    } else {
                        false
                    }
                });
                let app = app.clone();
                tokio::spawn(async move {
                    app.closed().await;
                    let _ = tx.send(ShutdownTrigger::NaturalExit);
                });
            }
            Err(_) => {
                let _ = tx.send(ShutdownTrigger::NaturalExit);
            }
        }
        let _ = outcome_tx.send(Some(outcome));
    });

    outcome_rx
}

fn spawn_signal_listener(tx: mpsc::UnboundedSender<ShutdownTrigger>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match signals::wait_for_shutdown_signal().await {
                Ok(signal) => {
                    info!(signal, "[shutdown] termination signal received");
                    if tx.send(ShutdownTrigger::Signal).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "[shutdown] cannot listen for termination signals");
                    break;
                }
            }
        }
    })
}

/// The teardown body. Runs once per coordinator.
async fn teardown(
    trigger: ShutdownTrigger,
    mut outcome: watch::Receiver<Option<StartOutcome>>,
) -> ExitStatus {
    let settled = outcome
        .wait_for(Option::is_some)
        .await
        .map(|settled| (*settled).clone())
        .ok()
        .flatten();

    let app = match settled {
        Some(Ok(app)) => app,
        Some(Err(err)) => {
            error!(label = err.as_label(), "[shutdown] start failed; partial registrations were released by start: {err}");
            return ExitStatus::Success;
        }
        None => {
            error!("[shutdown] start was aborted; nothing to stop");
            return ExitStatus::Success;
        }
    };

    app.bus()
        .publish(Event::new(EventKind::ShutdownRequested).with_reason(trigger.to_string()));
    info!(workers = ?app.workers(), "[shutdown] closing workers");

    match app.stop().await {
        Ok(()) => info!("[shutdown] all workers closed"),
        Err(err) => error!(label = err.as_label(), "[stop-failed] {err}"),
    }
    ExitStatus::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionConfig, MapEnv, SupervisorConfig};
    use crate::core::Supervisor;
    use crate::core::test_support::{Behavior, Probe, ProbeLoader};
    use crate::error::LoadError;
    use crate::core::{LoaderFn, Registry};
    use std::time::Duration;

    fn supervisor(probes: Vec<Arc<Probe>>) -> Supervisor {
        Supervisor::builder(ConnectionConfig::default())
            .with_env(MapEnv::new())
            .with_config(SupervisorConfig {
                stop_grace: Duration::from_millis(200),
                ..SupervisorConfig::default()
            })
            .with_loader(ProbeLoader::new(probes))
            .build()
    }

    #[tokio::test]
    async fn test_repeated_triggers_tear_down_once() {
        let probes = vec![
            Probe::new("a", Behavior::RunForever),
            Probe::new("b", Behavior::RunForever),
        ];
        let sup = supervisor(probes.clone());
        let coord = ShutdownCoordinator::new().without_signals();
        let trigger = coord.trigger_handle();
        let mut phase = coord.phase();

        let run = tokio::spawn(coord.run(async move { sup.start().await }));
        phase.wait_for(|p| *p == Phase::Running).await.unwrap();

        for _ in 0..3 {
            trigger.trigger(ShutdownTrigger::Signal);
        }
        trigger.trigger(ShutdownTrigger::Requested("test".into()));

        assert_eq!(run.await.unwrap(), ExitStatus::Success);
        assert_eq!(*phase.borrow(), Phase::Stopped);
        for p in &probes {
            assert_eq!(p.closes(), 1);
            assert!(p.saw_cancel());
        }
    }

    #[tokio::test]
    async fn test_trigger_before_start_resolves_waits_for_handle() {
        let probe = Probe::new("late", Behavior::RunForever);
        let sup = supervisor(vec![probe.clone()]);
        let coord = ShutdownCoordinator::new().without_signals();
        coord.trigger_handle().trigger(ShutdownTrigger::Signal);

        let status = tokio::time::timeout(
            Duration::from_secs(2),
            coord.run(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                sup.start().await
            }),
        )
        .await
        .expect("must not hang");

        assert_eq!(status, ExitStatus::Success);
        assert_eq!(probe.runs(), 1);
        assert_eq!(probe.closes(), 1);
    }

    #[tokio::test]
    async fn test_failed_start_exits_without_hanging() {
        let early = Probe::new("a", Behavior::RunForever);
        let sup = Supervisor::builder(ConnectionConfig::default())
            .with_env(MapEnv::new())
            .with_loader(ProbeLoader::new(vec![early.clone()]))
            .with_loader(LoaderFn::new("broken", |_r: Arc<Registry>| async move {
                Err::<(), LoadError>(LoadError::fail("bad module"))
            }))
            .build();
        let coord = ShutdownCoordinator::new().without_signals();
        coord.trigger_handle().trigger(ShutdownTrigger::Signal);

        let status = tokio::time::timeout(
            Duration::from_secs(2),
            coord.run(async move { sup.start().await }),
        )
        .await
        .expect("must not hang");
        assert_eq!(status, ExitStatus::Success);
        assert_eq!(early.closes(), 1);
    }

    #[tokio::test]
    async fn test_failed_start_triggers_natural_exit() {
        let coord = ShutdownCoordinator::new().without_signals();
        let status = tokio::time::timeout(
            Duration::from_secs(2),
            coord.run(async {
                Err::<AppHandle, RuntimeError>(RuntimeError::StartAborted {
                    reason: "no config".into(),
                })
            }),
        )
        .await
        .expect("natural exit expected");
        assert_eq!(status, ExitStatus::Success);
    }

    #[tokio::test]
    async fn test_panicking_start_does_not_hang() {
        let coord = ShutdownCoordinator::new().without_signals();
        let status = tokio::time::timeout(
            Duration::from_secs(2),
            coord.run(async {
                if true {
                    panic!("start exploded");
                }
                Err::<AppHandle, RuntimeError>(RuntimeError::StartAborted {
                    reason: "unreachable".into(),
                })
            }),
        )
        .await
        .expect("must not hang");
        assert_eq!(status, ExitStatus::Success);
    }

    #[tokio::test]
    async fn test_natural_exit_when_workers_finish() {
        let probe = Probe::new("oneshot", Behavior::Finish);
        let sup = supervisor(vec![probe.clone()]);
        let coord = ShutdownCoordinator::new().without_signals();

        let status = tokio::time::timeout(
            Duration::from_secs(2),
            coord.run(async move { sup.start().await }),
        )
        .await
        .expect("natural exit expected");
        assert_eq!(status, ExitStatus::Success);
        assert_eq!(probe.closes(), 1);
    }

    #[tokio::test]
    async fn test_stop_failure_still_exits_successfully() {
        let probe = Probe::new("stubborn", Behavior::FailClose);
        let sup = supervisor(vec![probe.clone()]);
        let coord = ShutdownCoordinator::new().without_signals();
        coord
            .trigger_handle()
            .trigger(ShutdownTrigger::Requested("deploy".into()));

        let status = coord.run(async move { sup.start().await }).await;
        assert_eq!(status, ExitStatus::Success);
        assert_eq!(probe.closes(), 1);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::Failure.code(), 1);
        assert_eq!(ShutdownTrigger::Requested("x".into()).to_string(), "requested: x");
    }
}
