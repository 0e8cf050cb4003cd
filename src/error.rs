//! Error types used by tracked operations.
//!
//! The registry itself never fails: it performs no I/O and every mutation
//! leaves its maps consistent. Errors only appear at the edge where an
//! operation is run under a timeout or a cancellation token:
//!
//! - [`OperationError`]: the operation did not produce its own output.
//!
//! The wrapped operation's own failures are never mapped into this type; a
//! future yielding `Result<T, E>` comes back as `Ok(Err(e))` untouched.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by [`Operation::run`](crate::Operation::run).
///
/// In every case the busy flag of the operation has already been cleared
/// when the error is returned.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// Operation exceeded its timeout and was dropped.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Operation was cancelled through its cancellation token.
    #[error("operation cancelled")]
    Canceled,
}

impl OperationError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use loadvisor::OperationError;
    /// use std::time::Duration;
    ///
    /// let err = OperationError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "operation_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            OperationError::Timeout { .. } => "operation_timeout",
            OperationError::Canceled => "operation_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            OperationError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            OperationError::Canceled => "cancelled by token".to_string(),
        }
    }

    /// Indicates whether the operation was stopped from the outside.
    ///
    /// Returns `true` only for [`OperationError::Canceled`].
    pub fn is_cancellation(&self) -> bool {
        matches!(self, OperationError::Canceled)
    }
}
