//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] an extension point for plugging custom event handlers
//! into a registry built with [`RegistryBuilder`](crate::RegistryBuilder).
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and logged through `tracing`)
//!
//! ## Rules
//! - A slow subscriber only affects its own queue.
//! - Queue overflow drops the event **for this subscriber only**.
//! - Events are processed sequentially (FIFO) per subscriber.
//! - Subscribers never block `set_busy` callers.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use loadvisor::{Event, EventKind, Subscribe};
//!
//! struct Spinner;
//!
//! #[async_trait]
//! impl Subscribe for Spinner {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::BusySet) {
//!             // show or hide an overlay...
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "spinner" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for registry observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, not in the publisher context.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in diagnostics.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber.
    ///
    /// The runtime clamps capacity to a minimum of 1. Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
