mod common;

use std::sync::Arc;

use common::{conversation, message_at, FakeChatApi};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;
use warden_client::{bridge, ChatSync, ClientError, LoadState};
use warden_shared::constants::EVENT_MESSAGE_SENT;
use warden_shared::{Conversation, ConversationKind, Message};
use warden_transport::{ChatTransport, InMemoryPubSub};

struct Fixture {
    api: Arc<FakeChatApi>,
    pubsub: InMemoryPubSub,
    sync: Arc<ChatSync<Arc<FakeChatApi>, InMemoryPubSub>>,
}

fn fixture(conversations: Vec<Conversation>) -> Fixture {
    let api = Arc::new(FakeChatApi::with_conversations(conversations));
    let pubsub = InMemoryPubSub::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let transport = ChatTransport::new(pubsub.clone(), tx);
    let sync = Arc::new(ChatSync::new(Arc::clone(&api), transport));
    bridge::spawn_bridge(Arc::clone(&sync), rx);
    Fixture { api, pubsub, sync }
}

fn contents(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.content.as_str()).collect()
}

#[tokio::test]
async fn duplicate_delivery_is_ingested_once() {
    let a = conversation(ConversationKind::Private);
    let f = fixture(vec![a.clone()]);
    f.sync.load_conversations(1).await.unwrap();

    let msg = message_at(a.id, 0, "hello");
    f.sync.ingest_remote_message(msg.clone());
    f.sync.ingest_remote_message(msg.clone());

    let held = f.sync.messages_for(a.id);
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].id, msg.id);
    // The counter moved exactly once as well.
    assert_eq!(f.sync.total_unread(), 1);
}

#[tokio::test]
async fn unread_counters_follow_the_active_conversation() {
    let a = conversation(ConversationKind::Private);
    let b = conversation(ConversationKind::Group);
    let f = fixture(vec![a.clone(), b.clone()]);
    f.sync.load_conversations(1).await.unwrap();

    f.sync.select_conversation(&a).await.unwrap();

    // Remote message for the inactive conversation: unread goes up.
    f.sync.ingest_remote_message(message_at(b.id, 0, "psst"));
    // Remote message for the active conversation: unread stays at zero.
    f.sync.ingest_remote_message(message_at(a.id, 1, "hi"));

    let held: Vec<_> = f.sync.conversations();
    let unread_b = held.iter().find(|c| c.id == b.id).unwrap().unread_count;
    let unread_a = held.iter().find(|c| c.id == a.id).unwrap().unread_count;
    assert_eq!(unread_b, 1);
    assert_eq!(unread_a, 0);
    assert_eq!(f.sync.total_unread(), 1);
    assert_eq!(f.sync.unread_conversations().len(), 1);

    // Selecting the conversation resets its counter immediately.
    f.sync.select_conversation(&b).await.unwrap();
    assert_eq!(f.sync.total_unread(), 0);
    assert!(f.sync.unread_conversations().is_empty());
}

#[tokio::test]
async fn own_echo_never_bumps_unread() {
    let a = conversation(ConversationKind::Private);
    let b = conversation(ConversationKind::Private);
    let f = fixture(vec![a.clone(), b.clone()]);
    f.sync.load_conversations(1).await.unwrap();

    let me = Uuid::new_v4();
    f.sync.set_principal(me);
    f.sync.select_conversation(&a).await.unwrap();

    // Echo of our own message in a conversation that is not active.
    let mut echo = message_at(b.id, 0, "from my other tab");
    echo.sender_id = me;
    f.sync.ingest_remote_message(echo);

    assert_eq!(f.sync.total_unread(), 0);
    // The message itself is still held.
    assert_eq!(f.sync.messages_for(b.id).len(), 1);
}

#[tokio::test]
async fn send_then_echo_yields_exactly_one_message() {
    let a = conversation(ConversationKind::Private);
    let f = fixture(vec![a.clone()]);
    f.sync.load_conversations(1).await.unwrap();
    f.sync.select_conversation(&a).await.unwrap();

    let echo = message_at(a.id, 0, "hi");
    *f.api.send_echo.lock().unwrap() = Some(echo.clone());

    let sent = f.sync.send_message("hi").await.unwrap();
    assert_eq!(sent.id, echo.id);

    // No optimistic insert: the held list is still empty.
    assert!(f.sync.messages_for(a.id).is_empty());
    // But the denormalized pointer moved immediately.
    let held = f.sync.conversations();
    let last = held[0].last_message.as_ref().unwrap();
    assert_eq!(last.id, echo.id);

    // The transport echoes the same logical message back.
    f.sync.ingest_remote_message(echo.clone());
    let held = f.sync.messages_for(a.id);
    assert_eq!(contents(&held), ["hi"]);
}

#[tokio::test]
async fn older_pages_are_prepended_in_order() {
    let a = conversation(ConversationKind::Group);
    let f = fixture(vec![a.clone()]);
    f.sync.load_conversations(1).await.unwrap();

    let m1 = message_at(a.id, 1, "m1");
    let m2 = message_at(a.id, 2, "m2");
    let m3 = message_at(a.id, 3, "m3");
    let m4 = message_at(a.id, 4, "m4");
    f.api.put_page(a.id, 1, vec![m3, m4]);
    f.api.put_page(a.id, 2, vec![m1, m2]);

    f.sync.load_messages(a.id, 1).await.unwrap();
    assert_eq!(contents(&f.sync.messages_for(a.id)), ["m3", "m4"]);

    f.sync.load_messages(a.id, 2).await.unwrap();
    assert_eq!(
        contents(&f.sync.messages_for(a.id)),
        ["m1", "m2", "m3", "m4"]
    );
    assert_eq!(f.sync.load_state(a.id), LoadState::Loaded);
}

#[tokio::test]
async fn validation_rejects_before_any_network_call() {
    let a = conversation(ConversationKind::Private);
    let f = fixture(vec![a.clone()]);
    f.sync.load_conversations(1).await.unwrap();
    f.sync.select_conversation(&a).await.unwrap();

    for bad in ["", " ", "\t\n"] {
        let err = f.sync.send_message(bad).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)), "input {bad:?}");
    }

    let over = "x".repeat(1001);
    let err = f.sync.send_message(&over).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));

    assert!(f.api.sent.lock().unwrap().is_empty());

    let exact = "x".repeat(1000);
    f.sync.send_message(&exact).await.unwrap();
    assert_eq!(f.api.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn send_without_active_conversation_is_rejected() {
    let f = fixture(vec![]);
    let err = f.sync.send_message("hi").await.unwrap_err();
    assert!(matches!(err, ClientError::NoActiveConversation));
}

#[tokio::test]
async fn selecting_twice_binds_one_handler() {
    let a = conversation(ConversationKind::Private);
    let f = fixture(vec![a.clone()]);
    f.sync.load_conversations(1).await.unwrap();

    f.sync.select_conversation(&a).await.unwrap();
    f.sync.select_conversation(&a).await.unwrap();

    assert_eq!(f.pubsub.handler_count(&a.id.channel_name()), 1);
}

#[tokio::test]
async fn switching_conversations_retains_other_lists() {
    let a = conversation(ConversationKind::Private);
    let b = conversation(ConversationKind::Private);
    let f = fixture(vec![a.clone(), b.clone()]);
    f.sync.load_conversations(1).await.unwrap();

    f.api.put_page(a.id, 1, vec![message_at(a.id, 0, "in a")]);
    f.api.put_page(b.id, 1, vec![message_at(b.id, 0, "in b")]);

    f.sync.select_conversation(&a).await.unwrap();
    f.sync.select_conversation(&b).await.unwrap();

    assert_eq!(contents(&f.sync.messages_for(a.id)), ["in a"]);
    assert_eq!(contents(&f.sync.messages_for(b.id)), ["in b"]);
}

#[tokio::test]
async fn raced_ingestion_survives_page_one_load() {
    let a = conversation(ConversationKind::Private);
    let f = fixture(vec![a.clone()]);
    f.sync.load_conversations(1).await.unwrap();

    let old = message_at(a.id, 0, "from the server");
    f.api.put_page(a.id, 1, vec![old]);

    // Hold the page-1 response open.
    let (release, gate) = oneshot::channel();
    *f.api.gate.lock().unwrap() = Some(gate);

    let sync = Arc::clone(&f.sync);
    let id = a.id;
    let load = tokio::spawn(async move { sync.load_messages(id, 1).await });

    // A live message lands while the load is in flight.
    tokio::task::yield_now().await;
    f.sync.ingest_remote_message(message_at(a.id, 5, "raced"));

    release.send(()).unwrap();
    load.await.unwrap().unwrap();

    // The late-arriving page must not erase the raced message.
    assert_eq!(
        contents(&f.sync.messages_for(a.id)),
        ["from the server", "raced"]
    );
}

#[tokio::test]
async fn failed_load_keeps_prior_messages_and_reports() {
    let a = conversation(ConversationKind::Private);
    let f = fixture(vec![a.clone()]);
    f.sync.load_conversations(1).await.unwrap();

    f.api.put_page(a.id, 1, vec![message_at(a.id, 0, "kept")]);
    f.sync.load_messages(a.id, 1).await.unwrap();

    *f.api.fail_next_list.lock().unwrap() = true;
    let err = f.sync.load_messages(a.id, 1).await.unwrap_err();
    assert!(matches!(err, ClientError::Api(_)));

    assert_eq!(contents(&f.sync.messages_for(a.id)), ["kept"]);
    assert_eq!(f.sync.load_state(a.id), LoadState::Loaded);
    assert!(f.sync.last_error().is_some());
}

#[tokio::test]
async fn live_event_flows_from_pubsub_to_state() {
    let a = conversation(ConversationKind::Private);
    let f = fixture(vec![a.clone()]);
    f.sync.load_conversations(1).await.unwrap();
    f.sync.select_conversation(&a).await.unwrap();

    f.pubsub.publish(
        &a.id.channel_name(),
        EVENT_MESSAGE_SENT,
        serde_json::json!({
            "id": Uuid::new_v4(),
            "conversation_id": a.id.0,
            "content": "over the wire",
            "sender_id": Uuid::new_v4(),
            "sender_kind": "user",
            "created_at": "2026-03-01T12:30:00Z",
        }),
    );

    // Give the bridge task a chance to drain the channel.
    tokio::task::yield_now().await;

    assert_eq!(contents(&f.sync.messages_for(a.id)), ["over the wire"]);
}

#[tokio::test]
async fn start_conversation_is_idempotent() {
    let existing = conversation(ConversationKind::Private);
    let f = fixture(vec![existing.clone()]);
    f.sync.load_conversations(1).await.unwrap();

    *f.api.created.lock().unwrap() = Some(existing.clone());
    let got = f
        .sync
        .start_conversation_with_participant(Uuid::new_v4(), warden_shared::SenderKind::User)
        .await
        .unwrap();

    assert_eq!(got.id, existing.id);
    assert_eq!(f.sync.conversations().len(), 1);
}

#[tokio::test]
async fn new_conversation_is_prepended() {
    let held = conversation(ConversationKind::Private);
    let fresh = conversation(ConversationKind::Private);
    let f = fixture(vec![held.clone()]);
    f.sync.load_conversations(1).await.unwrap();

    *f.api.created.lock().unwrap() = Some(fresh.clone());
    f.sync
        .start_conversation_with_participant(Uuid::new_v4(), warden_shared::SenderKind::User)
        .await
        .unwrap();

    let held_now = f.sync.conversations();
    assert_eq!(held_now.len(), 2);
    assert_eq!(held_now[0].id, fresh.id);
}

#[tokio::test]
async fn invalid_creation_response_is_a_hard_error() {
    let f = fixture(vec![]);
    // `created: None` scripts a response without a valid id.
    let err = f
        .sync
        .start_conversation_with_participant(Uuid::new_v4(), warden_shared::SenderKind::User)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Api(warden_api::ApiError::Contract(_))
    ));
    assert!(f.sync.conversations().is_empty());
}
