//! # Owners: grouping keys and arena-issued handles.
//!
//! The registry is generic over its owner key ([`OwnerKey`]). Identity is
//! whatever the key's `Eq` says, so keys should carry identity (a handle, a
//! pointer-derived id), not structural content.
//!
//! The default key is [`OwnerId`], issued by [`Registry::register`]. The
//! returned [`Owner`] is a scoped guard: dropping it releases every entry of
//! that owner, ending its streams. This replaces garbage-collection-driven
//! cleanup with an explicit teardown tied to the owner's own lifetime.
//!
//! ```text
//! Registry::register() ─► Owner { id: OwnerId(n) }
//!                               │  set_busy / observe / wrap ...
//!                               ▼
//!                          drop(Owner) ─► Registry::release(&OwnerId(n))
//! ```

use std::fmt;
use std::future::Future;
use std::hash::Hash;

use futures::Stream;

use crate::core::entry::BusyStream;
use crate::core::indicator::IndicatorId;
use crate::core::registry::Registry;
use crate::operations::{BusyGuard, Operation, TrackedStream};

/// Requirements for a value used as an owner key.
///
/// Blanket-implemented; never implement it by hand.
pub trait OwnerKey: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> OwnerKey for T where T: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

/// Arena handle identifying one registered owner.
///
/// Handles are never reused within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(u64);

impl OwnerId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

/// Scoped owner registration.
///
/// Every method is the registry method of the same name bound to this
/// owner's [`OwnerId`]. Dropping the guard releases all of its entries.
///
/// ## Example
/// ```rust
/// use loadvisor::Registry;
///
/// let registry: Registry = Registry::new();
/// let owner = registry.register();
/// let id = owner.id();
///
/// owner.start_loading(Some("save".into()));
/// assert!(registry.is_busy(&id, None));
///
/// drop(owner);
/// assert!(!registry.is_busy(&id, None));
/// ```
#[must_use = "dropping an Owner releases its entries immediately"]
pub struct Owner {
    id: OwnerId,
    registry: Registry<OwnerId>,
}

impl Owner {
    pub(crate) fn new(id: OwnerId, registry: Registry<OwnerId>) -> Self {
        Self { id, registry }
    }

    /// Returns this owner's handle.
    pub fn id(&self) -> OwnerId {
        self.id
    }

    /// Returns the registry this owner belongs to.
    pub fn registry(&self) -> &Registry<OwnerId> {
        &self.registry
    }

    pub fn is_busy(&self, id: Option<IndicatorId>) -> bool {
        self.registry.is_busy(&self.id, id)
    }

    pub fn observe(&self, id: Option<IndicatorId>) -> BusyStream {
        self.registry.observe(&self.id, id)
    }

    pub fn set_busy(&self, id: Option<IndicatorId>, busy: bool) {
        self.registry.set_busy(&self.id, id, busy);
    }

    pub fn start_loading(&self, id: Option<IndicatorId>) {
        self.registry.start_loading(&self.id, id);
    }

    pub fn end_loading(&self, id: Option<IndicatorId>) {
        self.registry.end_loading(&self.id, id);
    }

    /// See [`Registry::wrap`].
    pub fn wrap<F: Future>(
        &self,
        fut: F,
        id: Option<IndicatorId>,
    ) -> impl Future<Output = F::Output> + use<F> {
        self.registry.wrap(fut, &self.id, id)
    }

    /// See [`Registry::wrap_stream`].
    pub fn wrap_stream<S: Stream>(
        &self,
        stream: S,
        id: Option<IndicatorId>,
    ) -> TrackedStream<S, OwnerId> {
        self.registry.wrap_stream(stream, &self.id, id)
    }

    /// See [`Registry::guard`].
    pub fn guard(&self, id: Option<IndicatorId>) -> BusyGuard<OwnerId> {
        self.registry.guard(&self.id, id)
    }

    /// See [`Registry::operation`].
    pub fn operation(&self) -> Operation<OwnerId> {
        self.registry.operation(&self.id)
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owner").field("id", &self.id).finish()
    }
}

impl Drop for Owner {
    fn drop(&mut self) {
        self.registry.release(&self.id);
    }
}
