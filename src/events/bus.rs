//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from multiple sources (supervisor, registry,
//! error monitors, shutdown coordinator).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                    Receivers (any):
//!   Supervisor     ──┐
//!   Registry       ──┼──────► Bus ─────► AppHandle::events()
//!   Error monitors ──┤  (broadcast chan)   (tests, host observers)
//!   Shutdown       ──┘
//! ```
//!
//! Publishing never blocks a worker or the shutdown path. Receivers that fall
//! more than `SupervisorConfig::bus_capacity` events behind see
//! `RecvError::Lagged(n)`; events published with no receiver are dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Clones share one channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
