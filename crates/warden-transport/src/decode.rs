//! Strict decode of incoming pub/sub events.
//!
//! The provider delivers loosely typed JSON. Everything is validated here:
//! a payload missing its id, conversation id, sender, or content is
//! rejected; a missing or malformed timestamp is normalized to now, since a
//! late message with an approximate time beats a dropped one.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use warden_shared::{ConversationId, Message, MessageKind, SenderKind};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid message event: {0}")]
    Invalid(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RawMessageEvent {
    id: Uuid,
    conversation_id: Uuid,
    content: String,
    sender_id: Uuid,
    sender_kind: SenderKind,
    #[serde(default)]
    kind: MessageKind,
    #[serde(default)]
    is_read: bool,
    #[serde(default)]
    created_at: Option<String>,
}

/// Decode a `message.sent` payload into a [`Message`].
pub fn message_event(payload: serde_json::Value) -> Result<Message, DecodeError> {
    let raw: RawMessageEvent = serde_json::from_value(payload)?;

    let created_at = match raw.created_at.as_deref() {
        Some(ts) => match DateTime::parse_from_rfc3339(ts) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!(
                    message = %raw.id,
                    timestamp = ts,
                    error = %e,
                    "malformed event timestamp, defaulting to now"
                );
                Utc::now()
            }
        },
        None => {
            tracing::warn!(message = %raw.id, "event without timestamp, defaulting to now");
            Utc::now()
        }
    };

    Ok(Message {
        id: raw.id,
        conversation_id: ConversationId(raw.conversation_id),
        content: raw.content,
        sender_id: raw.sender_id,
        sender_kind: raw.sender_kind,
        kind: raw.kind,
        is_read: raw.is_read,
        created_at,
    })
}
