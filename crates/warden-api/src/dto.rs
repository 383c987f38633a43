//! Wire DTOs and their strict conversion into domain models.
//!
//! The backend is an external collaborator; anything loosely shaped is
//! validated here before it crosses into the typed core.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_shared::{Conversation, ConversationId, ConversationKind, Message, Principal};

use crate::error::{ApiError, ApiResult};

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub total: u64,
}

/// Successful login payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub principal: Principal,
}

/// Error body the backend attaches to non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}

/// Conversation as the backend sends it. The id is optional here so a
/// contract violation surfaces as a typed error instead of a decode panic
/// deeper in the stack.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationDto {
    pub id: Option<Uuid>,
    pub kind: ConversationKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub participant_count: u32,
}

impl ConversationDto {
    /// Convert into the domain model, rejecting a response without a valid
    /// id so external corruption never enters local state.
    pub fn into_conversation(self) -> ApiResult<Conversation> {
        let id = self
            .id
            .ok_or_else(|| ApiError::Contract("conversation without an id".to_string()))?;
        Ok(Conversation {
            id: ConversationId(id),
            kind: self.kind,
            name: self.name,
            last_message: self.last_message,
            unread_count: self.unread_count,
            participant_count: self.participant_count,
        })
    }
}
