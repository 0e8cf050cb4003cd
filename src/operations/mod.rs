//! # Operation tracking.
//!
//! Ways to tie a busy flag to the lifetime of work:
//! - [`Registry::wrap`](crate::Registry::wrap) - one future, lazy, cleared on completion or drop;
//! - [`TrackedStream`] - a multi-value stream, cleared when it ends or is dropped;
//! - [`Operation`] - one future with timeout and cancellation token;
//! - [`BusyGuard`] - manual scope (set now, clear on drop).
//!
//! All of them are built on [`BusyGuard`], which guarantees exactly one
//! `set_busy(true)` and exactly one `set_busy(false)` per run.

mod guard;
mod operation;
mod tracked;

pub use guard::BusyGuard;
pub use operation::Operation;
pub use tracked::TrackedStream;
