use crate::config::{
    ConnectionConfig, EnvSource, ProcessEnv, SupervisorConfig, WorkerSelection,
};
use crate::core::{Loader, ModuleLoader, Registry, Supervisor};
use crate::events::Bus;

/// Builder for constructing a [`Supervisor`].
pub struct SupervisorBuilder {
    defaults: ConnectionConfig,
    cfg: SupervisorConfig,
    env: Box<dyn EnvSource + Send + Sync>,
    selection: Option<WorkerSelection>,
    loader: ModuleLoader,
}

impl SupervisorBuilder {
    /// Creates a new builder with the build-time connection defaults.
    ///
    /// Runtime overrides are read from the process environment unless
    /// [`with_env`](Self::with_env) says otherwise.
    pub fn new(defaults: ConnectionConfig) -> Self {
        Self {
            defaults,
            cfg: SupervisorConfig::default(),
            env: Box::new(ProcessEnv),
            selection: None,
            loader: ModuleLoader::new(),
        }
    }

    /// Sets the runtime configuration (stop grace, bus capacity).
    pub fn with_config(mut self, cfg: SupervisorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets where connection overrides and worker selection are read from.
    pub fn with_env(mut self, env: impl EnvSource + Send + Sync + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Overrides the worker include/exclude selection read from the environment.
    pub fn with_selection(mut self, selection: WorkerSelection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Appends a worker-definition loader. Loaders run in the order they are added.
    pub fn with_loader(mut self, loader: impl Loader) -> Self {
        self.loader.push(loader);
        self
    }

    /// Builds the supervisor and its (empty) registry.
    pub fn build(self) -> Supervisor {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let selection = self
            .selection
            .unwrap_or_else(|| WorkerSelection::from_env(&*self.env));
        let registry = Registry::new(self.cfg, bus.clone(), selection);

        Supervisor::new_internal(self.defaults, self.env, self.loader, registry, bus)
    }
}
