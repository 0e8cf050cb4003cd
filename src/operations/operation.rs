//! # Run one tracked operation with timeout and cancellation.
//!
//! [`Operation`] is a builder returned by [`Registry::operation`]. It marks an
//! (owner, indicator) pair busy for the duration of a single future and can
//! stop that future from the outside.
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   BusySet(true) → fut → Ok(output) → BusySet(false)
//!
//! Timeout:
//!   BusySet(true) → timeout exceeded → drop fut → publish OperationTimedOut
//!                                              → BusySet(false) → Err(Timeout)
//!
//! Cancellation:
//!   BusySet(true) → token cancelled → drop fut → publish OperationCanceled
//!                                            → BusySet(false) → Err(Canceled)
//! ```
//!
//! ## Rules
//! - Busy is set on the first poll of `run`, never at build time.
//! - Busy is cleared **exactly once** on every path, including dropping `run`'s future.
//! - The operation's own output (including `Err` values) is returned as-is inside `Ok`.
//! - A `0s` timeout means no timeout.
//! - Cancellation wins over completion when both are ready on the same poll.

use std::future::Future;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::{IndicatorId, OwnerKey, Registry};
use crate::error::OperationError;
use crate::events::{Event, EventKind};
use crate::operations::BusyGuard;

/// Builder for one tracked operation.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use loadvisor::{OperationError, Registry};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let registry: Registry<&'static str> = Registry::new();
///
/// let res = registry
///     .operation(&"grid")
///     .indicator("load")
///     .timeout(Duration::from_millis(10))
///     .run(std::future::pending::<()>())
///     .await;
///
/// assert_eq!(res, Err(OperationError::Timeout { timeout: Duration::from_millis(10) }));
/// assert!(!registry.is_busy(&"grid", None));
/// # }
/// ```
#[must_use = "an operation does nothing until `run` is awaited"]
pub struct Operation<O: OwnerKey> {
    registry: Registry<O>,
    owner: O,
    indicator: Option<IndicatorId>,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl<O: OwnerKey> Operation<O> {
    pub(crate) fn new(registry: Registry<O>, owner: O) -> Self {
        let timeout = registry.config().default_timeout();
        Self {
            registry,
            owner,
            indicator: None,
            timeout,
            cancel: None,
        }
    }

    /// Tracks the operation under `id` instead of the default indicator.
    pub fn indicator(mut self, id: impl Into<IndicatorId>) -> Self {
        self.indicator = Some(id.into());
        self
    }

    /// Overrides the configured timeout (`Duration::ZERO` disables it).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Stops the operation when `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Runs `fut` with the flag set, honoring timeout and cancellation.
    pub async fn run<F: Future>(self, fut: F) -> Result<F::Output, OperationError> {
        let guard = BusyGuard::start(self.registry.clone(), self.owner, self.indicator);
        let cancel = self.cancel.unwrap_or_else(CancellationToken::new);

        let res = match self.timeout.filter(|d| *d > Duration::ZERO) {
            Some(dur) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(OperationError::Canceled),
                    r = time::timeout(dur, fut) => r.map_err(|_elapsed| OperationError::Timeout { timeout: dur }),
                }
            }
            None => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(OperationError::Canceled),
                    out = fut => Ok(out),
                }
            }
        };

        match &res {
            Err(OperationError::Timeout { timeout }) => {
                publish_timeout(&self.registry, guard.owner(), guard.indicator(), *timeout);
            }
            Err(OperationError::Canceled) => {
                publish_canceled(&self.registry, guard.owner(), guard.indicator());
            }
            Ok(_) => {}
        }

        guard.finish();
        res
    }
}

/// Publishes `OperationTimedOut` (always followed by `BusySet(false)`).
fn publish_timeout<O: OwnerKey>(
    registry: &Registry<O>,
    owner: &O,
    indicator: &IndicatorId,
    dur: Duration,
) {
    registry.publish_with(|| {
        Event::new(EventKind::OperationTimedOut)
            .with_owner(owner)
            .with_indicator(indicator.clone())
            .with_timeout(dur)
    });
}

/// Publishes `OperationCanceled` (always followed by `BusySet(false)`).
fn publish_canceled<O: OwnerKey>(registry: &Registry<O>, owner: &O, indicator: &IndicatorId) {
    registry.publish_with(|| {
        Event::new(EventKind::OperationCanceled)
            .with_owner(owner)
            .with_indicator(indicator.clone())
    });
}
