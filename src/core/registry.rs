//! # Loading-state registry.
//!
//! Owns the two-level map `owner → indicator → entry` and publishes every
//! mutation on the event [`Bus`].
//!
//! ## Architecture
//! ```text
//! set_busy(o, id, v) ──┐
//! observe(o, id)   ────┼─► RwLock<HashMap<O, HashMap<IndicatorId, Entry>>>
//! release(o)       ────┤                         │
//! clear_all()      ────┘                         ├─► Entry::set ─► BusyStream(s)
//!                                                └─► Bus::publish(Event)
//! is_busy(o, id?) ─────► read lock, never creates state
//! ```
//!
//! ## Rules
//! - Entries are created lazily by `set_busy` and `observe` (the latter with `false`).
//! - `is_busy` without an id is the logical OR over the owner's indicators.
//! - Mutation and fan-out for one pair happen under one write lock, so
//!   streams observe transitions in call order.
//! - `clear_all` and `release` drop entries; their streams drain and end.
//! - No reference counting: the last `set_busy` wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::Stream;
use tokio::sync::broadcast;

use crate::core::builder::RegistryBuilder;
use crate::core::config::Config;
use crate::core::entry::{BusyStream, Entry};
use crate::core::indicator::IndicatorId;
use crate::core::owner::{Owner, OwnerId, OwnerKey};
use crate::events::{Bus, Event, EventKind};
use crate::operations::{BusyGuard, Operation, TrackedStream};

type Entries = HashMap<IndicatorId, Entry>;

struct Inner<O> {
    cfg: Config,
    owners: RwLock<HashMap<O, Entries>>,
    next_owner: AtomicU64,
    bus: Bus,
}

/// Shared registry of owner-scoped busy flags.
///
/// Cheap to clone: all clones share the same state.
///
/// The default owner key is [`OwnerId`]; use [`Registry::register`] to obtain
/// scoped owners. Any other [`OwnerKey`] works with explicit
/// [`Registry::release`] calls.
///
/// ## Example
/// ```rust
/// use loadvisor::Registry;
///
/// let registry: Registry<&'static str> = Registry::new();
/// registry.set_busy(&"grid", Some("load".into()), true);
///
/// assert!(registry.is_busy(&"grid", Some("load".into())));
/// assert!(registry.is_busy(&"grid", None));
/// assert!(!registry.is_busy(&"grid", Some("save".into())));
/// ```
pub struct Registry<O = OwnerId> {
    inner: Arc<Inner<O>>,
}

impl<O> Clone for Registry<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: OwnerKey> Default for Registry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: OwnerKey> std::fmt::Debug for Registry<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("owners", &self.read().len())
            .field("cfg", &self.inner.cfg)
            .finish()
    }
}

impl<O: OwnerKey> Registry<O> {
    /// Creates a registry with [`Config::default`] and no subscribers.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a registry with the given config and no subscribers.
    pub fn with_config(cfg: Config) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self::from_parts(cfg, bus)
    }

    /// Returns a builder for a registry with event subscribers.
    pub fn builder(cfg: Config) -> RegistryBuilder<O> {
        RegistryBuilder::new(cfg)
    }

    pub(crate) fn from_parts(cfg: Config, bus: Bus) -> Self {
        Self {
            inner: Arc::new(Inner {
                cfg,
                owners: RwLock::new(HashMap::new()),
                next_owner: AtomicU64::new(0),
                bus,
            }),
        }
    }

    /// Returns the registry configuration.
    pub fn config(&self) -> &Config {
        &self.inner.cfg
    }

    /// Returns `id` if provided, else [`IndicatorId::DEFAULT`].
    pub fn resolve_indicator(&self, id: Option<IndicatorId>) -> IndicatorId {
        IndicatorId::resolve(id)
    }

    /// Reports whether the owner is busy.
    ///
    /// - With an id: that indicator's flag (`false` if absent).
    /// - Without an id: `true` if **any** indicator of the owner is busy.
    ///
    /// Never creates state.
    pub fn is_busy(&self, owner: &O, id: Option<IndicatorId>) -> bool {
        let owners = self.read();
        let Some(entries) = owners.get(owner) else {
            return false;
        };
        match id {
            Some(id) => entries.get(&id).is_some_and(Entry::is_busy),
            None => entries.values().any(Entry::is_busy),
        }
    }

    /// Returns a replay-latest stream for `(owner, id)`.
    ///
    /// Creates the entry with `false` if it does not exist yet.
    pub fn observe(&self, owner: &O, id: Option<IndicatorId>) -> BusyStream {
        let id = IndicatorId::resolve(id);
        let mut owners = self.write();
        let entries = owners.entry(owner.clone()).or_default();
        let entry = entries.entry(id.clone()).or_insert_with(|| {
            self.publish_with(|| {
                Event::new(EventKind::EntryCreated)
                    .with_owner(owner)
                    .with_indicator(id.clone())
                    .with_busy(false)
            });
            Entry::new(false)
        });
        entry.watch()
    }

    /// Sets the flag for `(owner, id)`, creating the entry if needed.
    ///
    /// Every call is pushed to live streams, even when the value is unchanged.
    pub fn set_busy(&self, owner: &O, id: Option<IndicatorId>, busy: bool) {
        let id = IndicatorId::resolve(id);
        let mut owners = self.write();
        let entries = owners.entry(owner.clone()).or_default();
        match entries.get_mut(&id) {
            Some(entry) => entry.set(busy),
            None => {
                entries.insert(id.clone(), Entry::new(busy));
            }
        }
        self.publish_with(|| {
            Event::new(EventKind::BusySet)
                .with_owner(owner)
                .with_indicator(id)
                .with_busy(busy)
        });
    }

    /// Shorthand for `set_busy(owner, id, true)`.
    pub fn start_loading(&self, owner: &O, id: Option<IndicatorId>) {
        self.set_busy(owner, id, true);
    }

    /// Shorthand for `set_busy(owner, id, false)`.
    pub fn end_loading(&self, owner: &O, id: Option<IndicatorId>) {
        self.set_busy(owner, id, false);
    }

    /// Clears `(owner, id)` only if the entry still exists.
    ///
    /// Used by guards whose owner may have been released (or the registry
    /// cleared) while the tracked work was in flight: a missing entry already
    /// reads `false` and must not be re-created. Returns `true` if the entry
    /// was found.
    pub(crate) fn end_if_present(&self, owner: &O, id: &IndicatorId) -> bool {
        let found = {
            let mut owners = self.write();
            match owners.get_mut(owner).and_then(|entries| entries.get_mut(id)) {
                Some(entry) => {
                    entry.set(false);
                    true
                }
                None => false,
            }
        };
        if found {
            self.publish_with(|| {
                Event::new(EventKind::BusySet)
                    .with_owner(owner)
                    .with_indicator(id.clone())
                    .with_busy(false)
            });
        }
        found
    }

    /// Drops every entry of `owner`, ending its streams.
    ///
    /// Returns `true` if the owner had any entries.
    pub fn release(&self, owner: &O) -> bool {
        let removed = self.write().remove(owner);
        match removed {
            Some(entries) => {
                self.publish_with(|| {
                    Event::new(EventKind::OwnerReleased)
                        .with_owner(owner)
                        .with_reason(format!("indicators={}", entries.len()))
                });
                true
            }
            None => false,
        }
    }

    /// Discards all owners and indicators; every outstanding stream ends.
    ///
    /// Recovery of last resort: meant for a global failure hook (see
    /// [`Registry::clear_on_error`]), not for normal control flow.
    pub fn clear_all(&self) {
        self.clear_with_reason("clear_all");
    }

    /// Awaits `fut` and calls [`clear_all`](Self::clear_all) if it fails.
    ///
    /// The result is returned unchanged. Use it at the boundary of a request
    /// layer so that no stale busy flag survives an unrecoverable error.
    pub async fn clear_on_error<F, T, E>(&self, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let res = fut.await;
        if let Err(e) = &res {
            self.clear_with_reason(&e.to_string());
        }
        res
    }

    fn clear_with_reason(&self, reason: &str) {
        let dropped = std::mem::take(&mut *self.write());
        self.publish_with(|| {
            Event::new(EventKind::RegistryCleared)
                .with_reason(format!("{reason}; owners={}", dropped.len()))
        });
    }

    /// Returns the owners that currently have entries (unordered).
    pub fn owners(&self) -> Vec<O> {
        self.read().keys().cloned().collect()
    }

    /// Returns the sorted indicator ids registered under `owner`.
    pub fn indicators(&self, owner: &O) -> Vec<IndicatorId> {
        let mut ids: Vec<IndicatorId> = self
            .read()
            .get(owner)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// Creates an independent receiver of registry events.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// Brackets `fut` with `set_busy(true)` on first poll and
    /// `set_busy(false)` when it completes or is dropped.
    ///
    /// Lazy: a future that is never polled never touches the registry.
    /// The output is passed through unchanged.
    ///
    /// Overlapping wraps on the same pair are not counted: whichever finishes
    /// first clears the flag.
    pub fn wrap<F: Future>(
        &self,
        fut: F,
        owner: &O,
        id: Option<IndicatorId>,
    ) -> impl Future<Output = F::Output> + use<F, O> {
        let registry = self.clone();
        let owner = owner.clone();
        async move {
            let _guard = BusyGuard::start(registry, owner, id);
            fut.await
        }
    }

    /// Stream variant of [`wrap`](Self::wrap): busy from the first
    /// `poll_next` until the stream ends or is dropped.
    pub fn wrap_stream<S: Stream>(
        &self,
        stream: S,
        owner: &O,
        id: Option<IndicatorId>,
    ) -> TrackedStream<S, O> {
        TrackedStream::new(stream, self.clone(), owner.clone(), id)
    }

    /// Sets `(owner, id)` busy now and clears it when the guard drops.
    pub fn guard(&self, owner: &O, id: Option<IndicatorId>) -> BusyGuard<O> {
        BusyGuard::start(self.clone(), owner.clone(), id)
    }

    /// Starts building a tracked operation with timeout/cancellation.
    pub fn operation(&self, owner: &O) -> Operation<O> {
        Operation::new(self.clone(), owner.clone())
    }

    pub(crate) fn publish_with(&self, make: impl FnOnce() -> Event) {
        if self.inner.bus.has_receivers() {
            self.inner.bus.publish(make());
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<O, Entries>> {
        self.inner
            .owners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<O, Entries>> {
        self.inner
            .owners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Registry<OwnerId> {
    /// Issues a fresh owner handle wrapped in a scoped guard.
    pub fn register(&self) -> Owner {
        let raw = self.inner.next_owner.fetch_add(1, Ordering::Relaxed) + 1;
        Owner::new(OwnerId::new(raw), self.clone())
    }

    /// Process-wide registry, created on first use with [`Config::default`].
    pub fn global() -> &'static Registry<OwnerId> {
        static GLOBAL: OnceLock<Registry<OwnerId>> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load() -> Option<IndicatorId> {
        Some(IndicatorId::name("load"))
    }

    #[test]
    fn unknown_owner_is_not_busy_and_not_created() {
        let reg: Registry<&'static str> = Registry::new();
        assert!(!reg.is_busy(&"a", None));
        assert!(!reg.is_busy(&"a", load()));
        assert!(reg.owners().is_empty());
    }

    #[test]
    fn last_set_wins() {
        let reg: Registry<&'static str> = Registry::new();
        for v in [true, false, true, true] {
            reg.set_busy(&"a", load(), v);
        }
        assert!(reg.is_busy(&"a", load()));
        reg.set_busy(&"a", load(), false);
        assert!(!reg.is_busy(&"a", load()));
    }

    #[test]
    fn no_id_is_or_over_indicators() {
        let reg: Registry<&'static str> = Registry::new();
        reg.set_busy(&"a", load(), false);
        reg.set_busy(&"a", Some(IndicatorId::Index(2)), false);
        assert!(!reg.is_busy(&"a", None));

        reg.set_busy(&"a", Some(IndicatorId::Index(2)), true);
        assert!(reg.is_busy(&"a", None));
        assert!(!reg.is_busy(&"a", load()));
    }

    #[test]
    fn omitted_id_maps_to_default_indicator() {
        let reg: Registry<&'static str> = Registry::new();
        reg.set_busy(&"a", None, true);
        assert!(reg.is_busy(&"a", None));
        assert!(reg.is_busy(&"a", Some(IndicatorId::DEFAULT)));
        assert!(!reg.is_busy(&"a", Some("other-id".into())));
        assert_eq!(reg.indicators(&"a"), vec![IndicatorId::DEFAULT]);
    }

    #[test]
    fn owners_do_not_share_indicators() {
        let reg: Registry<&'static str> = Registry::new();
        reg.set_busy(&"a", load(), true);
        assert!(!reg.is_busy(&"b", load()));
    }

    #[test]
    fn observe_creates_entry_with_false() {
        let reg: Registry<&'static str> = Registry::new();
        let mut s = reg.observe(&"a", load());
        assert_eq!(s.try_next_value(), Some(false));
        assert_eq!(reg.indicators(&"a"), vec![IndicatorId::name("load")]);
        assert!(!reg.is_busy(&"a", None));
    }

    #[test]
    fn late_subscriber_gets_latest_then_updates() {
        let reg: Registry<&'static str> = Registry::new();
        reg.set_busy(&"a", load(), true);
        reg.set_busy(&"a", load(), false);
        reg.set_busy(&"a", load(), true);

        let mut s = reg.observe(&"a", load());
        reg.set_busy(&"a", load(), false);

        let seen: Vec<bool> = std::iter::from_fn(|| s.try_next_value()).collect();
        assert_eq!(seen, vec![true, false]);
    }

    #[test]
    fn release_drops_only_that_owner() {
        let reg: Registry<&'static str> = Registry::new();
        reg.set_busy(&"a", None, true);
        reg.set_busy(&"b", None, true);

        assert!(reg.release(&"a"));
        assert!(!reg.release(&"a"));
        assert!(!reg.is_busy(&"a", None));
        assert!(reg.is_busy(&"b", None));
    }

    #[test]
    fn clear_all_resets_everything() {
        let reg: Registry<&'static str> = Registry::new();
        reg.set_busy(&"a", load(), true);
        reg.set_busy(&"b", None, true);
        let mut old = reg.observe(&"a", load());

        reg.clear_all();

        assert!(!reg.is_busy(&"a", load()));
        assert!(!reg.is_busy(&"b", None));
        assert!(reg.owners().is_empty());
        assert_eq!(old.try_next_value(), Some(true));
        assert_eq!(old.try_next_value(), None);

        let mut fresh = reg.observe(&"a", load());
        assert_eq!(fresh.try_next_value(), Some(false));
    }

    #[test]
    fn registered_owners_get_distinct_ids() {
        let reg: Registry = Registry::new();
        let a = reg.register();
        let b = reg.register();
        assert_ne!(a.id(), b.id());

        a.start_loading(None);
        assert!(a.is_busy(None));
        assert!(!b.is_busy(None));
    }

    #[test]
    fn dropping_owner_releases_entries() {
        let reg: Registry = Registry::new();
        let owner = reg.register();
        let id = owner.id();
        owner.start_loading(load());
        let mut s = owner.observe(load());

        drop(owner);

        assert!(!reg.is_busy(&id, None));
        assert!(reg.indicators(&id).is_empty());
        assert_eq!(s.latest(), Some(true));
    }

    #[test]
    fn events_are_published_for_mutations() {
        let reg: Registry<&'static str> = Registry::new();
        let mut rx = reg.events();

        let _s = reg.observe(&"a", load());
        reg.set_busy(&"a", load(), true);
        reg.release(&"a");
        reg.clear_all();

        let kinds: Vec<EventKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::EntryCreated,
                EventKind::BusySet,
                EventKind::OwnerReleased,
                EventKind::RegistryCleared,
            ]
        );
    }

    #[test]
    fn global_registry_is_shared() {
        let a = Registry::global().register();
        a.start_loading(None);
        assert!(Registry::global().is_busy(&a.id(), None));
    }
}
