//! Domain model structs exchanged with the REST backend and handed to the
//! UI layer.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can round-trip
//! through the REST API and the durable snapshot store unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::MAX_MESSAGE_CHARS;
use crate::error::ValidationError;
use crate::types::{ConversationId, ConversationKind, MessageKind, SenderKind};

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// The authenticated actor using the console.
///
/// Replaced wholesale on re-login; cleared on logout or credential
/// invalidation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    /// Super-admins bypass every permission check.
    pub is_super_admin: bool,
    /// Roles assigned to this principal, unique by role id.
    pub roles: Vec<Role>,
}

// ---------------------------------------------------------------------------
// Role / Permission
// ---------------------------------------------------------------------------

/// A named bundle of permissions. Immutable once fetched for a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    /// Order is preserved for display only.
    pub permissions: Vec<Permission>,
}

/// A single grant, keyed by `slug` for checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Permission {
    pub id: Uuid,
    pub slug: String,
    pub resource: String,
    pub action: String,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// A private or group messaging thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: ConversationId,
    pub kind: ConversationKind,
    /// Server-side display name; absent for unnamed private threads.
    pub name: Option<String>,
    /// Denormalized pointer to the most recent message. May be stale.
    pub last_message: Option<Message>,
    /// Messages delivered while this conversation was not active.
    pub unread_count: u32,
    pub participant_count: u32,
}

impl Conversation {
    /// Label shown in the conversation list, derived when `name` is absent.
    pub fn display_name(&self) -> String {
        match (&self.name, self.kind) {
            (Some(name), _) if !name.trim().is_empty() => name.clone(),
            (_, ConversationKind::Private) => "Direct message".to_string(),
            (_, ConversationKind::Group) => {
                format!("Group ({} participants)", self.participant_count)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: ConversationId,
    pub content: String,
    pub sender_id: Uuid,
    pub sender_kind: SenderKind,
    pub kind: MessageKind,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Validate outbound message content before it reaches the network.
///
/// Returns the trimmed content on success.
pub fn validate_content(content: &str) -> Result<&str, ValidationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    let got = trimmed.chars().count();
    if got > MAX_MESSAGE_CHARS {
        return Err(ValidationError::ContentTooLong {
            max: MAX_MESSAGE_CHARS,
            got,
        });
    }
    Ok(trimmed)
}
