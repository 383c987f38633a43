//! Transport-to-synchronizer bridge.
//!
//! The transport adapter forwards decoded messages over an unbounded
//! channel; this loop is the only consumer and applies each one through the
//! synchronizer's ingestion entry point, preserving single-writer
//! discipline.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use warden_api::ChatApi;
use warden_shared::Message;
use warden_transport::PubSub;

use crate::chat::ChatSync;

/// Spawn the ingestion loop. It runs until the transport side of the
/// channel is dropped.
pub fn spawn_bridge<C, P>(
    sync: Arc<ChatSync<C, P>>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) -> JoinHandle<()>
where
    C: ChatApi + 'static,
    P: PubSub + 'static,
{
    tokio::spawn(async move {
        tracing::info!("chat ingest bridge started");
        while let Some(message) = rx.recv().await {
            tracing::debug!(
                message = %message.id,
                conversation = %message.conversation_id,
                "ingesting remote message"
            );
            sync.ingest_remote_message(message);
        }
        tracing::warn!("chat ingest bridge ended");
    })
}
