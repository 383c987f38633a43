#![allow(dead_code)]

//! Scripted fakes for the REST surface, shared by the integration suites.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::oneshot;
use uuid::Uuid;

use warden_api::{ApiError, ApiResult, AuthApi, ChatApi, LoginResponse, Page};
use warden_shared::{
    Conversation, ConversationId, ConversationKind, Message, MessageKind, Permission, Principal,
    Role, SenderKind,
};

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// A message `minutes` after the fixed base time.
pub fn message_at(conversation: ConversationId, minutes: i64, content: &str) -> Message {
    Message {
        id: Uuid::new_v4(),
        conversation_id: conversation,
        content: content.to_string(),
        sender_id: Uuid::new_v4(),
        sender_kind: SenderKind::User,
        kind: MessageKind::Text,
        is_read: false,
        created_at: base_time() + Duration::minutes(minutes),
    }
}

pub fn conversation(kind: ConversationKind) -> Conversation {
    Conversation {
        id: ConversationId::new(),
        kind,
        name: None,
        last_message: None,
        unread_count: 0,
        participant_count: 2,
    }
}

pub fn permission(slug: &str) -> Permission {
    Permission {
        id: Uuid::new_v4(),
        slug: slug.to_string(),
        resource: slug.split('-').next().unwrap_or(slug).to_string(),
        action: slug.split('-').nth(1).unwrap_or("read").to_string(),
        is_active: true,
    }
}

pub fn role(name: &str, permissions: Vec<Permission>) -> Role {
    Role {
        id: Uuid::new_v4(),
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
        is_active: true,
        permissions,
    }
}

pub fn principal(roles: Vec<Role>, is_super_admin: bool) -> Principal {
    Principal {
        id: Uuid::new_v4(),
        name: "Ada".to_string(),
        email: "ada@example.test".to_string(),
        is_active: true,
        is_super_admin,
        roles,
    }
}

fn status_500() -> ApiError {
    ApiError::Status {
        status: 500,
        message: "scripted failure".to_string(),
    }
}

/// Scripted chat endpoints.
#[derive(Default)]
pub struct FakeChatApi {
    pub conversations: Mutex<Vec<Conversation>>,
    /// Pages keyed by (conversation, page), each ascending by time.
    pub messages: Mutex<HashMap<(Uuid, u32), Vec<Message>>>,
    /// Echo returned by `send_message`.
    pub send_echo: Mutex<Option<Message>>,
    /// Conversation returned by `create_conversation`; `None` scripts a
    /// response without a valid id.
    pub created: Mutex<Option<Conversation>>,
    /// Every (conversation, content) pair that reached the network.
    pub sent: Mutex<Vec<(ConversationId, String)>>,
    /// When set, the next `list_messages` call waits on this before
    /// answering, so a concurrent ingestion can be interleaved.
    pub gate: Mutex<Option<oneshot::Receiver<()>>>,
    /// Fail the next `list_messages` call with a 500.
    pub fail_next_list: Mutex<bool>,
}

impl FakeChatApi {
    pub fn with_conversations(conversations: Vec<Conversation>) -> Self {
        Self {
            conversations: Mutex::new(conversations),
            ..Self::default()
        }
    }

    pub fn put_page(&self, conversation: ConversationId, page: u32, messages: Vec<Message>) {
        self.messages
            .lock()
            .unwrap()
            .insert((conversation.0, page), messages);
    }
}

impl ChatApi for FakeChatApi {
    async fn list_conversations(&self, page: u32) -> ApiResult<Page<Conversation>> {
        let items = self.conversations.lock().unwrap().clone();
        let total = items.len() as u64;
        Ok(Page { items, page, total })
    }

    async fn create_conversation(
        &self,
        _participant_id: Uuid,
        _participant_kind: SenderKind,
    ) -> ApiResult<Conversation> {
        self.created
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::Contract("conversation without an id".to_string()))
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
        page: u32,
    ) -> ApiResult<Page<Message>> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if std::mem::take(&mut *self.fail_next_list.lock().unwrap()) {
            return Err(status_500());
        }

        let items = self
            .messages
            .lock()
            .unwrap()
            .get(&(conversation_id.0, page))
            .cloned()
            .unwrap_or_default();
        let total = items.len() as u64;
        Ok(Page { items, page, total })
    }

    async fn send_message(
        &self,
        conversation_id: ConversationId,
        content: &str,
    ) -> ApiResult<Message> {
        self.sent
            .lock()
            .unwrap()
            .push((conversation_id, content.to_string()));

        let echo = self.send_echo.lock().unwrap().clone();
        Ok(echo.unwrap_or_else(|| {
            let mut message = message_at(conversation_id, 0, content);
            message.created_at = Utc::now();
            message
        }))
    }
}

/// Scripted auth endpoints.
#[derive(Default)]
pub struct FakeAuthApi {
    /// Response for `login`; `None` scripts invalid credentials.
    pub login_response: Mutex<Option<LoginResponse>>,
    /// Response for `current_principal`; `None` scripts a 401.
    pub me: Mutex<Option<Principal>>,
    /// Every token handed to `set_token`.
    pub tokens: Mutex<Vec<String>>,
}

impl AuthApi for FakeAuthApi {
    fn set_token(&self, token: &str) {
        self.tokens.lock().unwrap().push(token.to_string());
    }

    fn clear_token(&self) {}

    async fn login(&self, _email: &str, _password: &str) -> ApiResult<LoginResponse> {
        self.login_response
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::Status {
                status: 401,
                message: "invalid credentials".to_string(),
            })
    }

    async fn logout(&self) -> ApiResult<()> {
        Ok(())
    }

    async fn current_principal(&self) -> ApiResult<Principal> {
        self.me.lock().unwrap().clone().ok_or(ApiError::Status {
            status: 401,
            message: "unauthenticated".to_string(),
        })
    }
}
