//! # Example: queue_runtime
//!
//! A generated-style runtime module: build-time connection defaults, two
//! worker-definition modules, and a `create_app()` factory that a host can
//! call to embed the workers. Run directly, it drives the full lifecycle
//! until Ctrl-C (or until every job loop finished).
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► logging::init()
//!   └─► Entry::run_if_main(create_app)
//!         ├─► Supervisor::start()
//!         │     ├─► resolve_connection(DEFAULTS, QUEUE_*)
//!         │     ├─► loader "mail"    ─► register(mailer)
//!         │     ├─► loader "reports" ─► register(report-builder)
//!         │     └─► start mailer, report-builder
//!         └─► ShutdownCoordinator: Ctrl-C ─► stop() ─► exit 0
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example queue_runtime
//! QUEUE_URL=queue://alt:6379 JOBVISOR_LOG=debug cargo run --example queue_runtime
//! JOBVISOR_WORKERS_EXCLUDE=report-builder cargo run --example queue_runtime
//! ```

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use jobvisor::{
    AppHandle, ConnectionConfig, Entry, LoadError, LoaderFn, Registry, RuntimeError, Supervisor,
    WorkerContext, WorkerError, WorkerFn, logging,
};
use tracing::info;

const DEFAULTS: &str = r#"{
    "host": "localhost",
    "port": 6379,
    "lazyConnect": false,
    "connectTimeout": 5000
}"#;

async fn mailer(ctx: WorkerContext) -> Result<(), WorkerError> {
    let target = ctx.connection().target();
    let mut tick = tokio::time::interval(Duration::from_millis(700));
    let mut sent = 0_u64;
    loop {
        tokio::select! {
            _ = ctx.cancelled() => {
                info!(worker = ctx.name(), sent, "mailer draining");
                return Ok(());
            }
            _ = tick.tick() => {
                sent += 1;
                info!(worker = ctx.name(), %target, job = sent, "mail sent");
            }
        }
    }
}

async fn report_builder(ctx: WorkerContext) -> Result<(), WorkerError> {
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    let mut job = 0_u64;
    loop {
        tokio::select! {
            _ = ctx.cancelled() => return Ok(()),
            _ = tick.tick() => {
                job += 1;
                if job % 3 == 0 {
                    // Reported, not fatal: the worker keeps consuming.
                    ctx.report(WorkerError::fail(format!("report {job} has no data source")));
                } else {
                    info!(worker = ctx.name(), job, "report built");
                }
            }
        }
    }
}

/// Builds and starts the application. Hosts embedding this module call it directly.
async fn create_app() -> Result<AppHandle, RuntimeError> {
    let defaults = ConnectionConfig::from_json(DEFAULTS).map_err(|e| RuntimeError::StartAborted {
        reason: format!("invalid connection defaults: {e}"),
    })?;

    let sup = Supervisor::builder(defaults)
        .with_loader(LoaderFn::new("mail", |registry: Arc<Registry>| async move {
            registry.register(WorkerFn::arc("mailer", mailer)).await?;
            Ok::<(), LoadError>(())
        }))
        .with_loader(LoaderFn::new("reports", |registry: Arc<Registry>| async move {
            registry
                .register(WorkerFn::arc("report-builder", report_builder))
                .await?;
            Ok::<(), LoadError>(())
        }))
        .build();

    sup.start().await
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = logging::init() {
        eprintln!("logging disabled: {e}");
    }

    // A compiled demo binary is always the program entry point.
    match Entry::new(true).run_if_main(create_app).await {
        Some(status) => status.into(),
        None => ExitCode::SUCCESS,
    }
}
