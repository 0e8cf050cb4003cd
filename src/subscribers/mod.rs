//! # Event subscribers for registries.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`] (feature `logging`).
//!
//! ## Architecture
//! ```text
//! Registry ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!                                                         │
//!                                              ┌──────────┼──────────┐
//!                                              ▼          ▼          ▼
//!                                          LogWriter   Spinner     Custom
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
