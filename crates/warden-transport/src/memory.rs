//! In-process pub/sub hub.
//!
//! Stands in for the external provider in tests and demos: handlers are
//! invoked synchronously on the publisher's thread, which makes redelivery
//! and interleaving scenarios easy to script.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::pubsub::{EventHandler, PubSub, PubSubChannel, TransportError};

struct Binding {
    subscriber: u64,
    event: String,
    handler: EventHandler,
}

#[derive(Default)]
struct Hub {
    bindings: Mutex<HashMap<String, Vec<Binding>>>,
    next_subscriber: AtomicU64,
}

impl Hub {
    fn bindings(&self) -> MutexGuard<'_, HashMap<String, Vec<Binding>>> {
        self.bindings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cloneable handle to a shared in-memory hub.
#[derive(Clone, Default)]
pub struct InMemoryPubSub {
    hub: Arc<Hub>,
}

impl InMemoryPubSub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `payload` to every handler bound to `event` on `channel`.
    pub fn publish(&self, channel: &str, event: &str, payload: serde_json::Value) {
        let bindings = self.hub.bindings();
        let Some(channel_bindings) = bindings.get(channel) else {
            return;
        };
        for binding in channel_bindings.iter().filter(|b| b.event == event) {
            (binding.handler)(payload.clone());
        }
    }

    /// Number of handlers currently bound on `channel`, across all events.
    pub fn handler_count(&self, channel: &str) -> usize {
        self.hub.bindings().get(channel).map_or(0, Vec::len)
    }
}

impl PubSub for InMemoryPubSub {
    type Channel = InMemoryChannel;

    fn subscribe(&self, channel: &str) -> Result<Self::Channel, TransportError> {
        let subscriber = self.hub.next_subscriber.fetch_add(1, Ordering::Relaxed);
        Ok(InMemoryChannel {
            hub: Arc::clone(&self.hub),
            name: channel.to_string(),
            subscriber,
        })
    }
}

/// A live subscription on the hub. Dropping it unbinds its handlers.
pub struct InMemoryChannel {
    hub: Arc<Hub>,
    name: String,
    subscriber: u64,
}

impl PubSubChannel for InMemoryChannel {
    fn bind(&self, event: &str, handler: EventHandler) {
        self.hub
            .bindings()
            .entry(self.name.clone())
            .or_default()
            .push(Binding {
                subscriber: self.subscriber,
                event: event.to_string(),
                handler,
            });
    }
}

impl Drop for InMemoryChannel {
    fn drop(&mut self) {
        let mut bindings = self.hub.bindings();
        if let Some(channel_bindings) = bindings.get_mut(&self.name) {
            channel_bindings.retain(|b| b.subscriber != self.subscriber);
            if channel_bindings.is_empty() {
                bindings.remove(&self.name);
            }
        }
    }
}
