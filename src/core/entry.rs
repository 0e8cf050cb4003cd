//! # Loading entry: one busy flag plus its replay-latest fan-out.
//!
//! ## Architecture
//! ```text
//! Entry { busy, watchers }
//!   set(v) ─► busy = v ─► watchers.retain(|tx| tx.send(v).is_ok())
//!   watch() ─► prune closed ─► tx.send(busy) (replay) ─► watchers.push(tx) ─► BusyStream(rx)
//! ```
//!
//! ## Rules
//! - The flag is stored once; subscribers only ever see values sent from it,
//!   so the synchronous view and the stream view cannot diverge.
//! - Every `set` is delivered, even when the value did not change.
//! - Each watcher has its own unbounded queue: no coalescing, no reordering.
//! - Dropping the entry drops all senders; streams drain and then end.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

/// Per (owner, indicator) state.
#[derive(Debug)]
pub(crate) struct Entry {
    busy: bool,
    watchers: Vec<mpsc::UnboundedSender<bool>>,
}

impl Entry {
    pub(crate) fn new(busy: bool) -> Self {
        Self {
            busy,
            watchers: Vec::new(),
        }
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.busy
    }

    /// Stores the flag and pushes it to every live watcher.
    pub(crate) fn set(&mut self, busy: bool) {
        self.busy = busy;
        self.watchers.retain(|tx| tx.send(busy).is_ok());
    }

    /// Opens a new stream seeded with the current value.
    ///
    /// Watchers whose stream was dropped are pruned here as well as in `set`.
    pub(crate) fn watch(&mut self) -> BusyStream {
        self.watchers.retain(|tx| !tx.is_closed());
        let (tx, rx) = mpsc::unbounded_channel();
        // Receiver is alive here; send cannot fail.
        let _ = tx.send(self.busy);
        self.watchers.push(tx);
        BusyStream { rx }
    }

    #[cfg(test)]
    pub(crate) fn watcher_count(&self) -> usize {
        self.watchers.len()
    }
}

/// Stream of busy-flag transitions for one (owner, indicator) pair.
///
/// Yields the value current at subscription time first, then every later
/// `set_busy` in issue order. Ends (`None`) once the owner is released or the
/// registry is cleared, after any buffered values were delivered.
///
/// ## Example
/// ```rust
/// use futures::StreamExt;
/// use loadvisor::Registry;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let registry: Registry<&'static str> = Registry::new();
/// let mut busy = registry.observe(&"toolbar", None);
/// registry.set_busy(&"toolbar", None, true);
///
/// assert_eq!(busy.next().await, Some(false));
/// assert_eq!(busy.next().await, Some(true));
/// # }
/// ```
#[derive(Debug)]
pub struct BusyStream {
    rx: mpsc::UnboundedReceiver<bool>,
}

impl BusyStream {
    /// Returns the next buffered transition without waiting.
    ///
    /// `None` means nothing is pending right now **or** the stream has ended.
    pub fn try_next_value(&mut self) -> Option<bool> {
        self.rx.try_recv().ok()
    }

    /// Drains every pending transition and returns the most recent one.
    pub fn latest(&mut self) -> Option<bool> {
        let mut last = None;
        while let Ok(v) = self.rx.try_recv() {
            last = Some(v);
        }
        last
    }
}

impl Stream for BusyStream {
    type Item = bool;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<bool>> {
        self.rx.poll_recv(cx)
    }
}
