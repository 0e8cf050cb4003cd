//! # Event bus for broadcasting registry events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from the registry and tracked operations.
//!
//! ## Architecture
//! ```text
//! Publishers:                          Receivers:
//!   Registry::set_busy ──┐
//!   Registry::release  ──┼──► Bus ──┬──► fan-out listener ──► SubscriberSet
//!   Registry::clear_*  ──┤          └──► Registry::events() (user receivers)
//!   Operation::run     ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active receivers at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for registry events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to at least 1).
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

    /// True if at least one receiver is alive.
    ///
    /// Lets publishers skip building events nobody would see.
    #[inline]
    pub fn has_receivers(&self) -> bool {
        self.tx.receiver_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn publish_without_receivers_is_a_noop() {
        let bus = Bus::new(0);
        assert!(!bus.has_receivers());
        bus.publish(Event::new(EventKind::RegistryCleared));
    }

    #[test]
    fn receivers_see_events_published_after_subscribing() {
        let bus = Bus::new(4);
        bus.publish(Event::new(EventKind::RegistryCleared));

        let mut rx = bus.subscribe();
        assert!(bus.has_receivers());
        bus.publish(Event::new(EventKind::BusySet).with_busy(true));

        let ev = rx.try_recv().expect("event");
        assert_eq!(ev.kind, EventKind::BusySet);
        assert!(rx.try_recv().is_err());
    }
}
