//! Events broadcast to the UI layer.
//!
//! The UI subscribes through [`crate::chat::ChatSync::subscribe_events`]
//! and re-renders from the synchronizer's snapshot accessors when one
//! arrives.

use warden_shared::{ConversationId, Message};

/// Broadcast channel capacity; a slow UI drops the oldest events.
pub const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A message arrived through the live transport.
    MessageReceived(Message),
    /// A locally-authored message was accepted by the backend.
    MessageSent(Message),
    /// A conversation's unread counter was reset.
    ConversationRead(ConversationId),
    /// The conversation list changed shape (refresh or creation).
    ConversationsChanged,
}
