//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor`, `Registry`, worker error monitors, `ShutdownCoordinator`.
//! - **Consumers**: anything holding [`AppHandle::events`](crate::AppHandle::events).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
