use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use super::{config::Config, owner::OwnerKey, registry::Registry};
use crate::{
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Registry`] with event subscribers.
pub struct RegistryBuilder<O> {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    _owner: PhantomData<fn() -> O>,
}

impl<O: OwnerKey> RegistryBuilder<O> {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            _owner: PhantomData,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive registry events (busy transitions, releases,
    /// clears, operation timeouts) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the registry.
    ///
    /// With subscribers, this spawns the fan-out listener and therefore must
    /// be called from within a Tokio runtime. The listener stops once the
    /// last registry handle is dropped.
    pub fn build(self) -> Registry<O> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        if !self.subscribers.is_empty() {
            let subs = Arc::new(SubscriberSet::new(self.subscribers));
            spawn_listener(&bus, subs);
        }
        Registry::from_parts(self.cfg, bus)
    }
}

/// Forwards bus events to the subscriber set until the bus closes.
fn spawn_listener(bus: &Bus, set: Arc<SubscriberSet>) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "loadvisor event listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
