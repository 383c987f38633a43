//! The chat synchronizer.
//!
//! Single writer for the in-memory conversation and message collections.
//! Locally-originated sends go to the REST backend and are *not* inserted
//! optimistically; the authoritative insertion happens when the transport
//! echoes the message back, with dedup by message id guarding against
//! redelivery. Message lists for every loaded conversation are retained for
//! the process lifetime.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use uuid::Uuid;

use warden_api::ChatApi;
use warden_shared::{
    validate_content, Conversation, ConversationId, Message, SenderKind,
};
use warden_transport::{ChatTransport, PubSub};

use crate::error::{ClientError, Result};
use crate::events::{ClientEvent, EVENT_CAPACITY};

/// Per-conversation message loading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    LoadingMore,
}

#[derive(Default)]
struct ChatState {
    conversations: Vec<Conversation>,
    /// Message lists keyed by conversation, ascending by creation time,
    /// unique by message id. Retained for every conversation ever loaded.
    messages: HashMap<ConversationId, Vec<Message>>,
    load_states: HashMap<ConversationId, LoadState>,
    active: Option<ConversationId>,
    /// Identifies the current principal's own echoes, which never bump
    /// unread counters.
    principal_id: Option<Uuid>,
    loading_conversations: bool,
    sending: bool,
    error: Option<String>,
}

/// Canonical owner of the live conversation/message collections.
pub struct ChatSync<C: ChatApi, P: PubSub> {
    api: C,
    transport: ChatTransport<P>,
    state: Mutex<ChatState>,
    events: broadcast::Sender<ClientEvent>,
}

impl<C: ChatApi, P: PubSub> ChatSync<C, P> {
    pub fn new(api: C, transport: ChatTransport<P>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            transport,
            state: Mutex::new(ChatState::default()),
            events,
        }
    }

    fn state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ClientEvent) {
        // No receivers is fine; the UI may not have subscribed yet.
        let _ = self.events.send(event);
    }

    /// Subscribe to state-change notifications.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Record which principal owns this session, for echo detection.
    pub fn set_principal(&self, principal_id: Uuid) {
        self.state().principal_id = Some(principal_id);
    }

    // -----------------------------------------------------------------------
    // Conversation directory
    // -----------------------------------------------------------------------

    /// Fetch the principal's conversation list and replace the held list
    /// wholesale — the server reorders by last activity, so a merge would
    /// fight it.
    pub async fn load_conversations(&self, page: u32) -> Result<()> {
        self.state().loading_conversations = true;

        match self.api.list_conversations(page).await {
            Ok(fetched) => {
                let mut state = self.state();
                state.conversations = fetched.items;
                state.loading_conversations = false;
                state.error = None;
                drop(state);
                self.emit(ClientEvent::ConversationsChanged);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load conversations");
                let mut state = self.state();
                state.loading_conversations = false;
                state.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Idempotent lookup-or-create of a conversation with one participant.
    ///
    /// A creation response without a valid id is rejected by the API layer
    /// as a contract violation before it can corrupt local state.
    pub async fn start_conversation_with_participant(
        &self,
        participant_id: Uuid,
        participant_kind: SenderKind,
    ) -> Result<Conversation> {
        let created = self
            .api
            .create_conversation(participant_id, participant_kind)
            .await?;

        let mut state = self.state();
        if let Some(existing) = state.conversations.iter().find(|c| c.id == created.id) {
            tracing::debug!(conversation = %created.id, "conversation already held");
            return Ok(existing.clone());
        }
        state.conversations.insert(0, created.clone());
        drop(state);

        self.emit(ClientEvent::ConversationsChanged);
        Ok(created)
    }

    // -----------------------------------------------------------------------
    // Selection / message loading
    // -----------------------------------------------------------------------

    /// Make `conversation` the active one: reset its unread counter, ensure
    /// a live subscription exists, and load its first message page. Message
    /// lists of other conversations are retained untouched.
    pub async fn select_conversation(&self, conversation: &Conversation) -> Result<()> {
        let id = conversation.id;
        self.state().active = Some(id);
        self.mark_conversation_read(id);

        // A failed subscription degrades to "no live updates"; it must not
        // block opening the conversation.
        if let Err(e) = self.transport.ensure_subscribed(id) {
            tracing::warn!(conversation = %id, error = %e, "live updates unavailable");
        }

        self.load_messages(id, 1).await
    }

    /// Reset a conversation's unread counter to zero.
    pub fn mark_conversation_read(&self, id: ConversationId) {
        let mut state = self.state();
        if let Some(conversation) = state.conversations.iter_mut().find(|c| c.id == id) {
            conversation.unread_count = 0;
        }
        drop(state);
        self.emit(ClientEvent::ConversationRead(id));
    }

    /// Load one page of messages for `id`.
    ///
    /// Page 1 merges by id on completion instead of blind-replacing, so a
    /// message ingested while the request was in flight is never erased.
    /// Pages above 1 prepend the older batch, preserving ascending order.
    /// On failure the conversation returns to its prior stable state and
    /// already-loaded messages stay put.
    pub async fn load_messages(&self, id: ConversationId, page: u32) -> Result<()> {
        {
            let mut state = self.state();
            let next = if page <= 1 {
                LoadState::Loading
            } else {
                LoadState::LoadingMore
            };
            state.load_states.insert(id, next);
        }

        match self.api.list_messages(id, page).await {
            Ok(fetched) => {
                let mut batch = fetched.items;
                batch.sort_by(|a, b| a.created_at.cmp(&b.created_at));

                let mut state = self.state();
                let held = state.messages.remove(&id).unwrap_or_default();

                let merged = if page <= 1 {
                    merge_first_page(batch, held)
                } else {
                    prepend_older_page(batch, held)
                };

                state.messages.insert(id, merged);
                state.load_states.insert(id, LoadState::Loaded);
                state.error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(conversation = %id, page, error = %e, "failed to load messages");
                let mut state = self.state();
                let stable = if state.messages.get(&id).is_some_and(|m| !m.is_empty()) {
                    LoadState::Loaded
                } else {
                    LoadState::NotLoaded
                };
                state.load_states.insert(id, stable);
                state.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Sending / ingestion
    // -----------------------------------------------------------------------

    /// Send `content` to the active conversation.
    ///
    /// The sent message is *not* inserted into the held list here — the
    /// transport echo is the single insertion path, which rules out the
    /// optimistic-insert/echo race entirely. The conversation's last-message
    /// pointer and unread counter are updated immediately.
    pub async fn send_message(&self, content: &str) -> Result<Message> {
        let trimmed = validate_content(content)?;

        let active = self
            .state()
            .active
            .ok_or(ClientError::NoActiveConversation)?;

        self.state().sending = true;

        match self.api.send_message(active, trimmed).await {
            Ok(message) => {
                let mut state = self.state();
                state.sending = false;
                if let Some(conversation) =
                    state.conversations.iter_mut().find(|c| c.id == active)
                {
                    conversation.last_message = Some(message.clone());
                    conversation.unread_count = 0;
                }
                drop(state);

                tracing::debug!(message = %message.id, conversation = %active, "message sent");
                self.emit(ClientEvent::MessageSent(message.clone()));
                Ok(message)
            }
            Err(e) => {
                tracing::warn!(conversation = %active, error = %e, "failed to send message");
                let mut state = self.state();
                state.sending = false;
                state.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Ingestion entry point for the transport adapter.
    ///
    /// Safe to call at any time relative to in-flight loads. Redelivery of
    /// an already-held message id is a no-op: the transport may redeliver
    /// on reconnect, so the dedup check is an invariant, not an
    /// optimization.
    pub fn ingest_remote_message(&self, message: Message) {
        let conversation_id = message.conversation_id;

        let mut state = self.state();
        let list = state.messages.entry(conversation_id).or_default();
        if list.iter().any(|m| m.id == message.id) {
            tracing::debug!(message = %message.id, "duplicate delivery ignored");
            return;
        }

        // Keep ascending creation-time order even for stragglers.
        let position = list
            .iter()
            .rposition(|m| m.created_at <= message.created_at)
            .map_or(0, |i| i + 1);
        list.insert(position, message.clone());

        let active = state.active;
        let own = state.principal_id == Some(message.sender_id);
        if let Some(conversation) = state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            conversation.last_message = Some(message.clone());
            if active != Some(conversation_id) && !own {
                conversation.unread_count += 1;
            }
        }
        drop(state);

        self.emit(ClientEvent::MessageReceived(message));
    }

    // -----------------------------------------------------------------------
    // Snapshots and derived views
    // -----------------------------------------------------------------------

    pub fn conversations(&self) -> Vec<Conversation> {
        self.state().conversations.clone()
    }

    pub fn active_conversation(&self) -> Option<Conversation> {
        let state = self.state();
        let active = state.active?;
        state.conversations.iter().find(|c| c.id == active).cloned()
    }

    pub fn messages_for(&self, id: ConversationId) -> Vec<Message> {
        self.state().messages.get(&id).cloned().unwrap_or_default()
    }

    pub fn load_state(&self, id: ConversationId) -> LoadState {
        self.state().load_states.get(&id).copied().unwrap_or_default()
    }

    /// Sum of all held conversations' unread counters. Derived on demand,
    /// never stored.
    pub fn total_unread(&self) -> u32 {
        self.state()
            .conversations
            .iter()
            .map(|c| c.unread_count)
            .sum()
    }

    /// Conversations with at least one unread message.
    pub fn unread_conversations(&self) -> Vec<Conversation> {
        self.state()
            .conversations
            .iter()
            .filter(|c| c.unread_count > 0)
            .cloned()
            .collect()
    }

    pub fn is_sending(&self) -> bool {
        self.state().sending
    }

    pub fn is_loading_conversations(&self) -> bool {
        self.state().loading_conversations
    }

    /// Last operation error, if any. Errors never wipe loaded data.
    pub fn last_error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Release every live transport subscription.
    pub fn shutdown(&self) {
        self.transport.shutdown();
    }
}

/// Merge a freshly fetched first page with whatever was held.
///
/// The fetched batch is authoritative for its own window; held messages
/// newer than the batch's newest entry were ingested while the request was
/// in flight and are kept. With an empty batch everything held is kept.
fn merge_first_page(batch: Vec<Message>, held: Vec<Message>) -> Vec<Message> {
    let newest_fetched = batch.last().map(|m| m.created_at);
    let mut merged = batch;
    for old in held {
        let duplicate = merged.iter().any(|m| m.id == old.id);
        let raced = newest_fetched.map_or(true, |t| old.created_at >= t);
        if !duplicate && raced {
            merged.push(old);
        }
    }
    merged.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    merged
}

/// Insert an older page in front of the held list, skipping ids already
/// present.
fn prepend_older_page(batch: Vec<Message>, held: Vec<Message>) -> Vec<Message> {
    let mut merged: Vec<Message> = batch
        .into_iter()
        .filter(|m| !held.iter().any(|h| h.id == m.id))
        .collect();
    merged.extend(held);
    merged
}
