//! API client configuration loaded from environment variables.
//!
//! All settings have defaults so the client can start with zero
//! configuration against a local backend.

use std::time::Duration;

/// REST client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the backend API, without a trailing slash.
    /// Env: `WARDEN_API_URL`
    /// Default: `http://localhost:8000/api`
    pub base_url: String,

    /// Per-request timeout.
    /// Env: `WARDEN_API_TIMEOUT_SECS`
    /// Default: `30`
    pub timeout: Duration,
}

impl ApiConfig {
    /// Build a configuration from the environment, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let base_url = std::env::var("WARDEN_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000/api".to_string());

        let timeout_secs = std::env::var("WARDEN_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}
