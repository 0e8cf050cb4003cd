//! Registry events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the registry and tracked operations.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Registry` (state events), `Operation::run` (timeout/cancel).
//! - **Consumers**: the builder's fan-out listener (feeds `SubscriberSet`) and
//!   any receiver obtained from `Registry::events()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
