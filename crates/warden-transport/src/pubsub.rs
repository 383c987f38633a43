//! Traits over the external pub/sub provider.

use thiserror::Error;

/// Callback invoked with the raw JSON payload of a bound event.
pub type EventHandler = Box<dyn Fn(serde_json::Value) + Send + Sync>;

/// A subscribed channel. Dropping the channel releases the subscription.
pub trait PubSubChannel: Send {
    /// Bind `handler` to `event` on this channel.
    fn bind(&self, event: &str, handler: EventHandler);
}

/// The provider's subscribe surface.
pub trait PubSub: Send + Sync {
    type Channel: PubSubChannel;

    fn subscribe(&self, channel: &str) -> Result<Self::Channel, TransportError>;
}

/// Errors produced by the transport layer.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The provider refused or failed the subscription.
    #[error("Subscription failed for channel {channel}: {reason}")]
    Subscribe { channel: String, reason: String },
}
