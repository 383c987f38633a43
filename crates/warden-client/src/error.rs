use thiserror::Error;

use warden_api::ApiError;
use warden_shared::ValidationError;
use warden_store::StoreError;

/// Errors surfaced by the client core.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Rejected before any network call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// REST layer failure (network, status, contract violation).
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Durable storage failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An operation that needs an active conversation was called without one.
    #[error("No active conversation selected")]
    NoActiveConversation,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
