use thiserror::Error;

/// Errors produced by the REST layer.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never completed (DNS, TLS, timeout, connection reset).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server responded {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not match the documented contract
    /// (e.g. a created conversation without an id).
    #[error("API contract violation: {0}")]
    Contract(String),
}

/// Convenience alias used throughout the crate.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
