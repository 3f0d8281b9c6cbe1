//! # Supervisor runtime configuration.
//!
//! Provides [`SupervisorConfig`], centralized settings for the supervisor runtime.
//!
//! ## Sentinel values
//! - `stop_grace = 0s` → stop waits for workers without a deadline
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `stop_grace`: Maximum wait for workers to finish after stop-all cancels them (`0s` = no limit)
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Maximum time to wait for workers to stop before aborting them.
    ///
    /// When stop-all runs:
    /// - Workers are cancelled via `CancellationToken`
    /// - Registry waits up to `stop_grace` for run futures to exit
    /// - Stragglers are aborted and reported as `ShutdownError::GraceExceeded`
    pub stop_grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` messages will
    /// receive `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl SupervisorConfig {
    /// Returns the stop grace period as an `Option`.
    ///
    /// - `None` → wait without a deadline
    /// - `Some(d)` → abort workers still running after `d`
    #[inline]
    pub fn stop_grace_limit(&self) -> Option<Duration> {
        if self.stop_grace == Duration::ZERO {
            None
        } else {
            Some(self.stop_grace)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `stop_grace = 30s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            stop_grace: Duration::from_secs(30),
            bus_capacity: 1024,
        }
    }
}
