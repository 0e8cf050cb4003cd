//! # Busy guard: set on creation, cleared exactly once.
//!
//! [`BusyGuard`] is the primitive under every wrapper in this crate. Creating
//! it calls `set_busy(owner, id, true)`; dropping it (or calling
//! [`BusyGuard::finish`]) clears the flag. Because the end mutation lives in
//! `Drop`, it runs on success, on error and when the surrounding future is
//! dropped mid-flight.
//!
//! If the owner was released (or the registry cleared) while the guard was
//! alive, the end is a no-op: the entry stays gone and reads `false`.

use crate::core::{IndicatorId, OwnerKey, Registry};

/// Scoped busy flag for one (owner, indicator) pair.
///
/// ## Example
/// ```rust
/// use loadvisor::Registry;
///
/// let registry: Registry<&'static str> = Registry::new();
/// {
///     let _busy = registry.guard(&"form", Some("save".into()));
///     assert!(registry.is_busy(&"form", Some("save".into())));
/// }
/// assert!(!registry.is_busy(&"form", Some("save".into())));
/// ```
#[must_use = "dropping a BusyGuard clears the flag immediately"]
pub struct BusyGuard<O: OwnerKey> {
    registry: Registry<O>,
    owner: O,
    indicator: IndicatorId,
    done: bool,
}

impl<O: OwnerKey> BusyGuard<O> {
    /// Sets the flag and returns the guard that will clear it.
    pub fn start(registry: Registry<O>, owner: O, id: Option<IndicatorId>) -> Self {
        let indicator = IndicatorId::resolve(id);
        registry.set_busy(&owner, Some(indicator.clone()), true);
        Self {
            registry,
            owner,
            indicator,
            done: false,
        }
    }

    /// The owner this guard marks busy.
    pub fn owner(&self) -> &O {
        &self.owner
    }

    /// The resolved indicator this guard marks busy.
    pub fn indicator(&self) -> &IndicatorId {
        &self.indicator
    }

    /// Clears the flag now instead of at scope end.
    pub fn finish(mut self) {
        self.end();
    }

    fn end(&mut self) {
        if !self.done {
            self.done = true;
            self.registry.end_if_present(&self.owner, &self.indicator);
        }
    }
}

impl<O: OwnerKey> Drop for BusyGuard<O> {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn start_then_finish_sets_twice() {
        let reg: Registry<&'static str> = Registry::new();
        let mut rx = reg.events();

        let guard = BusyGuard::start(reg.clone(), "a", None);
        assert!(reg.is_busy(&"a", None));
        assert!(guard.indicator().is_default());
        guard.finish();
        assert!(!reg.is_busy(&"a", None));

        let sets: Vec<Option<bool>> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|ev| ev.kind == EventKind::BusySet)
            .map(|ev| ev.busy)
            .collect();
        assert_eq!(sets, vec![Some(true), Some(false)]);
    }

    #[test]
    fn end_after_release_does_not_recreate_owner() {
        let reg: Registry<&'static str> = Registry::new();
        let guard = BusyGuard::start(reg.clone(), "a", Some("load".into()));
        assert_eq!(*guard.owner(), "a");

        assert!(reg.release(&"a"));
        drop(guard);

        assert!(reg.owners().is_empty());
        assert!(!reg.is_busy(&"a", None));
    }

    #[test]
    fn end_after_clear_all_leaves_registry_empty() {
        let reg: Registry<&'static str> = Registry::new();
        let guard = BusyGuard::start(reg.clone(), "a", None);
        reg.clear_all();
        guard.finish();
        assert!(reg.owners().is_empty());
    }
}
