//! # Entry gate for generated runtime binaries.
//!
//! A runtime module exposes a factory producing an [`AppHandle`]; the full
//! lifecycle (start, signal handling, shutdown) runs only when the host says
//! this module is the program entry point. Embedders that merely call the
//! factory get a handle and own its lifecycle themselves.

use std::future::Future;

use tracing::debug;

use crate::core::{AppHandle, ExitStatus, ShutdownCoordinator};
use crate::error::RuntimeError;

/// Decides whether the lifecycle runs, based on a flag supplied by the host.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    is_main: bool,
    signals: bool,
}

impl Entry {
    /// `is_main` is true when this module was invoked directly by the host.
    pub fn new(is_main: bool) -> Self {
        Self {
            is_main,
            signals: true,
        }
    }

    /// Skips OS signal listeners; shutdown then happens on natural exit only.
    pub fn without_signals(mut self) -> Self {
        self.signals = false;
        self
    }

    pub fn is_main(&self) -> bool {
        self.is_main
    }

    /// Runs `factory` under a [`ShutdownCoordinator`] when this is the entry point.
    ///
    /// Returns `None` (without calling `factory`) otherwise.
    pub async fn run_if_main<F, Fut>(self, factory: F) -> Option<ExitStatus>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AppHandle, RuntimeError>> + Send + 'static,
    {
        if !self.is_main {
            debug!("not the entry point; lifecycle left to the embedder");
            return None;
        }
        let mut coordinator = ShutdownCoordinator::new();
        if !self.signals {
            coordinator = coordinator.without_signals();
        }
        Some(coordinator.run(factory()).await)
    }
}
