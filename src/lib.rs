//! # loadvisor
//!
//! **Loadvisor** is a small registry of "is this busy right now" flags.
//!
//! Components and services register flags keyed by an owner plus an optional
//! indicator id, read them synchronously, observe them as replay-latest
//! streams, and tie them to the lifetime of async operations.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   UI component / service                      async work
//!          │  is_busy / observe                     │ wrap / wrap_stream / operation
//!          ▼                                        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Registry<O>                                                      │
//! │  - owner → indicator → Entry { busy, watchers }                   │
//! │  - Owner guards (arena ids, released on drop)                     │
//! │  - Bus (broadcast events for every mutation)                      │
//! └──────┬──────────────────────────────┬─────────────────────────────┘
//!        ▼                              ▼
//!   BusyStream (per observer)      Bus ──► listener ──► SubscriberSet
//!   replay current, then every           (optional)     ├─► LogWriter
//!   transition in call order                            └─► custom Subscribe
//! ```
//!
//! ### Lifecycle of a tracked operation
//! ```text
//! registry.wrap(fut, &owner, id)     → nothing happens yet (lazy)
//!   first poll  ─► set_busy(owner, id, true)
//!   fut ready   ─► set_busy(owner, id, false) ─► output returned unchanged
//!   fut dropped ─► set_busy(owner, id, false)
//! ```
//!
//! Overlapping operations on the same pair are not reference-counted: the
//! most recent `set_busy` wins, so the first one to finish clears the flag.
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                       |
//! |-------------------|---------------------------------------------------------------|------------------------------------------|
//! | **Registry**      | Owner-scoped flags, synchronous reads, global clear.          | [`Registry`], [`IndicatorId`], [`Owner`] |
//! | **Streams**       | Replay-latest stream per (owner, indicator).                  | [`BusyStream`]                           |
//! | **Operations**    | Busy for the lifetime of a future/stream, timeout, cancel.    | [`BusyGuard`], [`TrackedStream`], [`Operation`] |
//! | **Subscriber API**| Hook into registry events (logging, metrics, spinners).       | [`Subscribe`], [`SubscriberSet`]         |
//! | **Errors**        | Typed errors for timeout/cancel of tracked operations.        | [`OperationError`]                       |
//! | **Configuration** | Bus capacity and default operation timeout.                   | [`Config`]                               |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] that renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use loadvisor::{IndicatorId, Registry};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let registry: Registry = Registry::new();
//!     let page = registry.register();
//!
//!     let load = page.wrap(
//!         async {
//!             tokio::time::sleep(Duration::from_millis(5)).await;
//!             "Peek-a-boo"
//!         },
//!         Some(IndicatorId::name("load")),
//!     );
//!     assert!(!page.is_busy(None)); // lazy: not started yet
//!
//!     let text = load.await;
//!     assert_eq!(text, "Peek-a-boo");
//!     assert!(!page.is_busy(None));
//! }
//! ```
mod core;
mod error;
mod events;
mod operations;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{
    BusyStream, Config, IndicatorId, Owner, OwnerId, OwnerKey, Registry, RegistryBuilder,
};
pub use error::OperationError;
pub use events::{Bus, Event, EventKind};
pub use operations::{BusyGuard, Operation, TrackedStream};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
