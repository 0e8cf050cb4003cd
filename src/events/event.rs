//! # Events emitted by the registry and tracked operations.
//!
//! The [`EventKind`] enum classifies event types in two groups:
//! - **State events**: entry creation, busy transitions, owner release, global clear
//! - **Operation events**: tracked operations stopped from the outside (timeout, cancel)
//!
//! The [`Event`] struct carries metadata such as timestamp, owner label,
//! indicator and flag value.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. State events for one (owner, indicator) pair are created
//! under the registry lock, so their `seq` order equals mutation order.
//!
//! ## Example
//! ```rust
//! use loadvisor::{Event, EventKind, IndicatorId};
//!
//! let ev = Event::new(EventKind::BusySet)
//!     .with_owner(&"grid")
//!     .with_indicator(IndicatorId::name("load"))
//!     .with_busy(true);
//!
//! assert_eq!(ev.kind, EventKind::BusySet);
//! assert_eq!(ev.owner.as_deref(), Some("\"grid\""));
//! assert_eq!(ev.busy, Some(true));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::IndicatorId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of registry events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === State events ===
    /// An entry was created by `observe` (initial value `false`).
    ///
    /// Sets:
    /// - `owner`, `indicator`
    /// - `busy`: always `Some(false)`
    EntryCreated,

    /// `set_busy` was applied (including `start_loading` / `end_loading`).
    ///
    /// Sets:
    /// - `owner`, `indicator`
    /// - `busy`: the new value
    BusySet,

    /// All entries of one owner were dropped (explicit release or `Owner` drop).
    ///
    /// Sets:
    /// - `owner`
    /// - `reason`: number of dropped indicators
    OwnerReleased,

    /// Every owner was dropped (`clear_all` / `clear_on_error`).
    ///
    /// Sets:
    /// - `reason`: trigger and number of dropped owners
    RegistryCleared,

    // === Operation events ===
    /// A tracked operation exceeded its timeout.
    ///
    /// Sets:
    /// - `owner`, `indicator`
    /// - `timeout_ms`: configured timeout (ms)
    OperationTimedOut,

    /// A tracked operation was cancelled through its token.
    ///
    /// Sets:
    /// - `owner`, `indicator`
    OperationCanceled,
}

impl EventKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::EntryCreated => "entry_created",
            EventKind::BusySet => "busy_set",
            EventKind::OwnerReleased => "owner_released",
            EventKind::RegistryCleared => "registry_cleared",
            EventKind::OperationTimedOut => "operation_timed_out",
            EventKind::OperationCanceled => "operation_canceled",
        }
    }
}

/// Registry event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    /// Event classification.
    pub kind: EventKind,
    /// Debug rendering of the owner key, if applicable.
    pub owner: Option<Arc<str>>,
    /// Resolved indicator id, if applicable.
    pub indicator: Option<IndicatorId>,
    /// Flag value after the event, if applicable.
    pub busy: Option<bool>,
    /// Human-readable details.
    pub reason: Option<Arc<str>>,
    /// Operation timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            owner: None,
            indicator: None,
            busy: None,
            reason: None,
            timeout_ms: None,
        }
    }

    /// Attaches the owner, rendered with its `Debug` impl.
    #[inline]
    pub fn with_owner(mut self, owner: &impl fmt::Debug) -> Self {
        self.owner = Some(format!("{owner:?}").into());
        self
    }

    /// Attaches an indicator id.
    #[inline]
    pub fn with_indicator(mut self, id: IndicatorId) -> Self {
        self.indicator = Some(id);
        self
    }

    /// Attaches the flag value.
    #[inline]
    pub fn with_busy(mut self, busy: bool) -> Self {
        self.busy = Some(busy);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("seq", &self.seq)
            .field("kind", &self.kind)
            .field("owner", &self.owner)
            .field("indicator", &self.indicator)
            .field("busy", &self.busy)
            .field("reason", &self.reason)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}
