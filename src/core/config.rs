//! # Registry configuration.
//!
//! Provides [`Config`] centralized settings for a [`Registry`](crate::Registry).
//!
//! Config is used in two ways:
//! 1. **Registry creation**: `Registry::with_config(config)` / `Registry::builder(config)`
//! 2. **Operation defaults**: [`Operation`](crate::Operation) inherits `operation_timeout`
//!
//! ## Sentinel values
//! - `operation_timeout = 0s` → no timeout (treated as `None` by [`Config::default_timeout`])

use std::time::Duration;

/// Configuration for a loading-state registry.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `operation_timeout`: Default timeout for [`Operation::run`](crate::Operation::run) (`0s` = no timeout)
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` events will
    /// receive `Lagged` and skip older items.
    pub bus_capacity: usize,

    /// Default timeout for tracked operations.
    ///
    /// - `Duration::ZERO` = no timeout
    /// - `> 0` = operation is dropped (and its flag cleared) after this long
    ///
    /// Can be overridden per operation.
    pub operation_timeout: Duration,
}

impl Config {
    /// Returns the default operation timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → timeout applied per operation
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.operation_timeout == Duration::ZERO {
            None
        } else {
            Some(self.operation_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `operation_timeout = 0s` (no timeout)
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            operation_timeout: Duration::ZERO,
        }
    }
}
