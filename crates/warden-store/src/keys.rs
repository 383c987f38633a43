//! Fixed names for every persisted snapshot.
//!
//! All persistence goes through these constants so the set of durable keys
//! stays auditable in one place.

/// Bearer token issued at login.
pub const SESSION_TOKEN: &str = "session.token";

/// JSON snapshot of the authenticated principal.
pub const SESSION_PRINCIPAL: &str = "session.principal";

/// JSON list of the principal's roles (canonical permission source).
pub const AUTH_ROLES: &str = "auth.roles";

/// Legacy flat permission list, read only when no role list is persisted.
pub const AUTH_PERMISSIONS: &str = "auth.permissions";

/// Super-admin flag.
pub const AUTH_SUPER_ADMIN: &str = "auth.super_admin";
