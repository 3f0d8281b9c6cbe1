//! # Module loader: ordered worker-definition loaders.
//!
//! A [`Loader`] is one worker-definition module: when invoked it registers zero
//! or more workers into the shared [`Registry`]. The [`ModuleLoader`] runs its
//! loaders strictly one after another so registration order is reproducible.
//!
//! ## Rules
//! - Loader `n + 1` starts only after loader `n` fully completed.
//! - The first failing loader aborts the remaining ones and is returned as
//!   [`RuntimeError::ModuleLoad`]. A panicking loader counts as failing.

use std::borrow::Cow;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, error};

use crate::core::Registry;
use crate::core::monitor::panic_message;
use crate::error::{LoadError, RuntimeError};

/// # Worker-definition module.
#[async_trait]
pub trait Loader: Send + Sync + 'static {
    /// Loader name, used in logs and in [`RuntimeError::ModuleLoad`].
    fn name(&self) -> &str;

    /// Registers this module's workers.
    async fn load(&self, registry: Arc<Registry>) -> Result<(), LoadError>;
}

/// Closure-backed loader.
///
/// ```
/// use std::sync::Arc;
/// use jobvisor::{LoadError, LoaderFn, Registry, WorkerContext, WorkerError, WorkerFn};
///
/// let mailers = LoaderFn::new("mailers", |registry: Arc<Registry>| async move {
///     registry
///         .register(WorkerFn::arc("mailer", |ctx: WorkerContext| async move {
///             ctx.cancelled().await;
///             Ok::<(), WorkerError>(())
///         }))
///         .await?;
///     Ok::<(), LoadError>(())
/// });
/// # let _ = mailers;
/// ```
pub struct LoaderFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> LoaderFn<F> {
    /// Creates a new closure-backed loader.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

#[async_trait]
impl<F, Fut> Loader for LoaderFn<F>
where
    F: Fn(Arc<Registry>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), LoadError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self, registry: Arc<Registry>) -> Result<(), LoadError> {
        (self.f)(registry).await
    }
}

/// Ordered sequence of loaders.
#[derive(Default)]
pub struct ModuleLoader {
    loaders: Vec<Box<dyn Loader>>,
}

impl ModuleLoader {
    /// Creates an empty loader sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a loader; loaders run in insertion order.
    pub fn push(&mut self, loader: impl Loader) {
        self.loaders.push(Box::new(loader));
    }

    /// Runs every loader sequentially against `registry`.
    pub async fn load_all(&self, registry: &Arc<Registry>) -> Result<(), RuntimeError> {
        for loader in &self.loaders {
            debug!(loader = loader.name(), "loading module");
            let loaded = AssertUnwindSafe(loader.load(Arc::clone(registry)))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(LoadError::fail(format!("panicked: {}", panic_message(&*panic))))
                });
            if let Err(source) = loaded {
                let err = RuntimeError::ModuleLoad {
                    loader: loader.name().to_string(),
                    source,
                };
                error!(loader = loader.name(), label = err.as_label(), "[module-load-failed] {err}");
                return Err(err);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionConfig, SupervisorConfig, WorkerSelection};
    use crate::core::test_support::{Behavior, Probe};
    use crate::events::Bus;
    use std::sync::Mutex;
    use std::time::Duration;

    fn registry() -> Arc<Registry> {
        let reg = Registry::new(SupervisorConfig::default(), Bus::new(16), WorkerSelection::all());
        reg.install_connection(ConnectionConfig::default()).unwrap();
        reg
    }

    #[tokio::test]
    async fn test_loaders_run_sequentially_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut loader = ModuleLoader::new();

        for (name, delay_ms) in [("slow", 30_u64), ("fast", 0), ("mid", 10)] {
            let log = Arc::clone(&log);
            loader.push(LoaderFn::new(name, move |registry: Arc<Registry>| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().unwrap().push(format!("{name}:begin"));
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    registry.register(Probe::new(name, Behavior::RunForever)).await?;
                    log.lock().unwrap().push(format!("{name}:end"));
                    Ok::<(), LoadError>(())
                }
            }));
        }

        let reg = registry();
        loader.load_all(&reg).await.unwrap();

        assert_eq!(reg.names().await, vec!["slow", "fast", "mid"]);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["slow:begin", "slow:end", "fast:begin", "fast:end", "mid:begin", "mid:end"]
        );
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_loaders() {
        let mut loader = ModuleLoader::new();
        loader.push(LoaderFn::new("first", |registry: Arc<Registry>| async move {
            registry.register(Probe::new("a", Behavior::RunForever)).await?;
            Ok::<(), LoadError>(())
        }));
        loader.push(LoaderFn::new("broken", |_registry: Arc<Registry>| async move {
            Err::<(), LoadError>(LoadError::fail("cannot parse worker module"))
        }));
        loader.push(LoaderFn::new("never", |registry: Arc<Registry>| async move {
            registry.register(Probe::new("z", Behavior::RunForever)).await?;
            Ok::<(), LoadError>(())
        }));

        let reg = registry();
        let err = loader.load_all(&reg).await.unwrap_err();
        assert!(matches!(err, RuntimeError::ModuleLoad { ref loader, .. } if loader == "broken"));
        assert_eq!(reg.names().await, vec!["a"]);
    }

    #[tokio::test]
    async fn test_panicking_loader_is_a_load_failure() {
        let mut loader = ModuleLoader::new();
        loader.push(LoaderFn::new("explodes", |_registry: Arc<Registry>| async move {
            if true {
                panic!("bad worker module");
            }
            Ok::<(), LoadError>(())
        }));
        loader.push(LoaderFn::new("never", |registry: Arc<Registry>| async move {
            registry.register(Probe::new("z", Behavior::RunForever)).await?;
            Ok::<(), LoadError>(())
        }));

        let reg = registry();
        match loader.load_all(&reg).await {
            Err(RuntimeError::ModuleLoad { loader, source }) => {
                assert_eq!(loader, "explodes");
                assert_eq!(source.to_string(), "panicked: bad worker module");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn test_registry_errors_surface_as_module_load() {
        let mut loader = ModuleLoader::new();
        loader.push(LoaderFn::new("dupes", |registry: Arc<Registry>| async move {
            registry.register(Probe::new("a", Behavior::RunForever)).await?;
            registry.register(Probe::new("a", Behavior::RunForever)).await?;
            Ok::<(), LoadError>(())
        }));
        let err = loader.load_all(&registry()).await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::ModuleLoad {
                source: LoadError::Registry(_),
                ..
            }
        ));
    }
}
