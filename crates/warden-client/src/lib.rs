//! # warden-client
//!
//! Headless core of the Warden admin console: session lifecycle,
//! role/permission resolution, route gating, and real-time chat
//! synchronization over a pluggable pub/sub transport.

pub mod bridge;
pub mod chat;
pub mod events;
pub mod guard;
pub mod permissions;
pub mod session;
pub mod state;

mod error;

pub use chat::{ChatSync, LoadState};
pub use error::{ClientError, Result};
pub use events::ClientEvent;
pub use guard::{RouteDecision, RouteGuard, RouteTable};
pub use permissions::PermissionResolver;
pub use session::SessionContext;
pub use state::AppState;

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize tracing for the process. Call once, before [`AppState::init`].
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warden_client=debug,warden_transport=debug,warden_api=info,warden_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
