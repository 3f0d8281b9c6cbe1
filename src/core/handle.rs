//! # Application handle returned by [`Supervisor::start`](crate::Supervisor::start).

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::ConnectionConfig;
use crate::core::Registry;
use crate::error::ShutdownError;
use crate::events::{Bus, Event};

/// Running application: a stop operation plus the worker list at start time.
///
/// Cheap to clone; every clone controls the same workers. The worker list is
/// fixed when the handle is created, including workers that failed to start.
#[derive(Clone)]
pub struct AppHandle {
    registry: Arc<Registry>,
    bus: Bus,
    workers: Arc<[String]>,
}

impl AppHandle {
    pub(crate) fn new(registry: Arc<Registry>, bus: Bus, workers: Vec<String>) -> Self {
        Self {
            registry,
            bus,
            workers: workers.into(),
        }
    }

    /// Worker names in registration order.
    pub fn workers(&self) -> &[String] {
        &self.workers
    }

    /// Stops every worker. Safe to call any number of times; teardown happens once.
    pub async fn stop(&self) -> Result<(), ShutdownError> {
        self.registry.stop_all().await
    }

    /// Returns true once stop has completed.
    pub fn is_stopped(&self) -> bool {
        self.registry.is_stopped()
    }

    /// Completes once every started worker's job loop has finished on its own or after stop.
    pub async fn closed(&self) {
        self.registry.closed().await
    }

    /// The connection configuration shared by the workers.
    pub fn connection(&self) -> Option<Arc<ConnectionConfig>> {
        self.registry.connection()
    }

    /// Subscribes to runtime events.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.bus
    }
}

impl std::fmt::Debug for AppHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppHandle")
            .field("workers", &self.workers)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
