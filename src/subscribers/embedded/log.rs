//! # LogWriter: structured event logger
//!
//! A minimal subscriber that renders incoming [`Event`]s through `tracing`.
//! Install any `tracing` subscriber (e.g. `tracing-subscriber`) to see them.
//!
//! ## Example output (fmt layer)
//! ```text
//! DEBUG loadvisor: entry created owner="OwnerId(1)" indicator=load
//!  INFO loadvisor: busy owner="OwnerId(1)" indicator=load busy=true
//!  INFO loadvisor: owner released owner="OwnerId(1)" reason="indicators=1"
//!  WARN loadvisor: registry cleared reason="connection reset; owners=3"
//!  WARN loadvisor: operation timed out owner="OwnerId(2)" indicator=_DEFAULT timeout_ms=5000
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let owner = e.owner.as_deref().unwrap_or("-");
        let indicator = e
            .indicator
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::EntryCreated => {
                tracing::debug!(target: "loadvisor", seq = e.seq, owner, %indicator, "entry created");
            }
            EventKind::BusySet => {
                tracing::info!(target: "loadvisor", seq = e.seq, owner, %indicator, busy = ?e.busy, "busy");
            }
            EventKind::OwnerReleased => {
                tracing::info!(target: "loadvisor", seq = e.seq, owner, reason, "owner released");
            }
            EventKind::RegistryCleared => {
                tracing::warn!(target: "loadvisor", seq = e.seq, reason, "registry cleared");
            }
            EventKind::OperationTimedOut => {
                tracing::warn!(
                    target: "loadvisor",
                    seq = e.seq,
                    owner,
                    %indicator,
                    timeout_ms = ?e.timeout_ms,
                    "operation timed out"
                );
            }
            EventKind::OperationCanceled => {
                tracing::info!(target: "loadvisor", seq = e.seq, owner, %indicator, "operation cancelled");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
