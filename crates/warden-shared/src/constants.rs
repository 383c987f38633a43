//! Limits and fixed names used across the workspace.

/// Maximum message length in characters, enforced before transmission.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Pub/sub event name carrying a newly persisted chat message.
pub const EVENT_MESSAGE_SENT: &str = "message.sent";

/// Route the guard sends unauthenticated principals to.
pub const LOGIN_ROUTE: &str = "/auth/login";

/// Registration route, reachable while unauthenticated.
pub const REGISTER_ROUTE: &str = "/auth/register";

/// Default landing route for authenticated principals.
pub const DASHBOARD_ROUTE: &str = "/";
