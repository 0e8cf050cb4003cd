//! Registry core: state, owners and configuration.
//!
//! The public API from this module is [`Registry`] and the types it hands
//! out. Internal modules:
//! - [`registry`]: owner → indicator → entry map, mutation and event publishing;
//! - [`entry`]: per-pair flag with replay-latest fan-out ([`BusyStream`]);
//! - [`owner`]: owner keys, arena handles and the scoped [`Owner`] guard;
//! - [`indicator`]: indicator ids and default resolution;
//! - [`builder`]: registry construction with subscribers;
//! - [`config`]: registry settings.

mod builder;
mod config;
mod entry;
mod indicator;
mod owner;
mod registry;

pub use builder::RegistryBuilder;
pub use config::Config;
pub use entry::BusyStream;
pub use indicator::IndicatorId;
pub use owner::{Owner, OwnerId, OwnerKey};
pub use registry::Registry;
