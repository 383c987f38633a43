//! The chat transport adapter.
//!
//! One channel per conversation, subscribed lazily and exactly once. The
//! adapter never touches synchronizer state itself: decoded messages go out
//! through a single ingestion sender the synchronizer side consumes.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use warden_shared::constants::EVENT_MESSAGE_SENT;
use warden_shared::{ConversationId, Message};

use crate::decode;
use crate::pubsub::{PubSub, PubSubChannel, TransportError};

/// Per-conversation subscription manager over a [`PubSub`] provider.
pub struct ChatTransport<P: PubSub> {
    pubsub: P,
    ingest_tx: mpsc::UnboundedSender<Message>,
    channels: Mutex<HashMap<ConversationId, P::Channel>>,
}

impl<P: PubSub> ChatTransport<P> {
    /// Create the adapter. `ingest_tx` is the synchronizer's ingestion entry
    /// point; everything the adapter decodes is forwarded there and nowhere
    /// else.
    pub fn new(pubsub: P, ingest_tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            pubsub,
            ingest_tx,
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<ConversationId, P::Channel>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to the channel for `conversation_id` if not already
    /// subscribed. Idempotent: a second call for the same id is a no-op and
    /// never binds a second handler.
    pub fn ensure_subscribed(&self, conversation_id: ConversationId) -> Result<(), TransportError> {
        let mut channels = self.channels();
        if channels.contains_key(&conversation_id) {
            return Ok(());
        }

        let name = conversation_id.channel_name();
        let channel = self.pubsub.subscribe(&name)?;

        let tx = self.ingest_tx.clone();
        channel.bind(
            EVENT_MESSAGE_SENT,
            Box::new(move |payload| match decode::message_event(payload) {
                Ok(message) => {
                    // Receiver gone means the process is shutting down.
                    let _ = tx.send(message);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "dropping undecodable chat event");
                }
            }),
        );

        tracing::debug!(channel = %name, "subscribed to conversation channel");
        channels.insert(conversation_id, channel);
        Ok(())
    }

    /// Whether a subscription for `conversation_id` is live.
    pub fn is_subscribed(&self, conversation_id: ConversationId) -> bool {
        self.channels().contains_key(&conversation_id)
    }

    /// Number of live channel subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.channels().len()
    }

    /// Release every channel subscription. Process-wide teardown, so no
    /// per-channel unbind bookkeeping is attempted.
    pub fn shutdown(&self) {
        let mut channels = self.channels();
        let released = channels.len();
        channels.clear();
        tracing::info!(released, "transport shut down");
    }
}
