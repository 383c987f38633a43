//! Live-update transport layer bridging the chat synchronizer to an
//! external pub/sub provider.
//!
//! The provider itself is a black box reached through the [`PubSub`] /
//! [`PubSubChannel`] traits: one logical channel per conversation, named
//! `chat.<conversation id>`. Incoming payloads are strictly decoded and
//! normalized at this boundary before they enter the typed message model.

pub mod adapter;
pub mod decode;
pub mod memory;
pub mod pubsub;

pub use adapter::ChatTransport;
pub use memory::InMemoryPubSub;
pub use pubsub::{EventHandler, PubSub, PubSubChannel, TransportError};
