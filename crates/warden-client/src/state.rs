//! Application state wiring.
//!
//! [`AppState`] assembles the store, API client, session context,
//! permission resolver, route guard, chat synchronizer, and the ingest
//! bridge into one handle the UI layer owns for the process lifetime.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use warden_api::{ApiClient, ApiConfig};
use warden_store::Store;
use warden_transport::{ChatTransport, PubSub};

use crate::chat::ChatSync;
use crate::error::Result;
use crate::guard::{RouteGuard, RouteTable};
use crate::permissions::PermissionResolver;
use crate::session::SessionContext;

/// Central application state, generic over the pub/sub provider.
pub struct AppState<P: PubSub + 'static> {
    pub store: Arc<Store>,
    pub api: Arc<ApiClient>,
    pub session: SessionContext,
    pub permissions: Arc<PermissionResolver>,
    pub guard: RouteGuard,
    pub chat: Arc<ChatSync<Arc<ApiClient>, P>>,
    bridge: JoinHandle<()>,
}

impl<P: PubSub + 'static> AppState<P> {
    /// Initialize the full client core: open the default store, build the
    /// API client from `config`, restore persisted permissions, and spawn
    /// the ingest bridge. Must run inside a tokio runtime.
    pub fn init(pubsub: P, config: &ApiConfig) -> Result<Self> {
        let store = Arc::new(Store::open_default()?);
        Self::with_store(store, pubsub, config)
    }

    /// Like [`Self::init`] with an explicit store, for tests and embeddings.
    pub fn with_store(store: Arc<Store>, pubsub: P, config: &ApiConfig) -> Result<Self> {
        let api = Arc::new(ApiClient::new(config)?);

        let permissions = Arc::new(PermissionResolver::new(Arc::clone(&store)));
        permissions.restore()?;

        let session = SessionContext::new(Arc::clone(&store));
        let guard = RouteGuard::new(RouteTable::standard());

        let (ingest_tx, ingest_rx) = mpsc::unbounded_channel();
        let transport = ChatTransport::new(pubsub, ingest_tx);
        let chat = Arc::new(ChatSync::new(Arc::clone(&api), transport));
        let bridge = crate::bridge::spawn_bridge(Arc::clone(&chat), ingest_rx);

        tracing::info!("client core initialized");

        Ok(Self {
            store,
            api,
            session,
            permissions,
            guard,
            chat,
            bridge,
        })
    }

    /// Tear down live subscriptions and stop the ingest bridge.
    pub fn shutdown(&self) {
        self.chat.shutdown();
        self.bridge.abort();
        tracing::info!("client core shut down");
    }
}
