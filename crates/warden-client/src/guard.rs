//! Navigation gating.
//!
//! Every transition is evaluated in two steps: authentication first
//! (redirects), then authorization against the route's required permission
//! slugs (an explicit deny, never a silent redirect). The first evaluation
//! of a session triggers lazy hydration from durable storage plus a
//! best-effort remote identity refresh.

use std::collections::HashMap;

use warden_api::AuthApi;
use warden_shared::constants::{DASHBOARD_ROUTE, LOGIN_ROUTE, REGISTER_ROUTE};

use crate::permissions::PermissionResolver;
use crate::session::SessionContext;

/// Outcome of a navigation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    /// Navigation should land on the given route instead.
    Redirect(&'static str),
    /// Authorization failed; render a 403-equivalent page.
    Deny,
}

/// Maps route paths to required-permission-slug lists. An empty (or absent)
/// list means the route is public to any authenticated principal.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    required: HashMap<String, Vec<String>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration of a guarded route.
    pub fn route(mut self, path: &str, slugs: &[&str]) -> Self {
        self.required
            .insert(path.to_string(), slugs.iter().map(|s| s.to_string()).collect());
        self
    }

    /// The console's route map.
    pub fn standard() -> Self {
        Self::new()
            .route("/domains", &["domain-read"])
            .route("/reports", &["report-read"])
            .route("/users", &["user-read"])
            .route("/admins", &["admin-read"])
            .route("/roles", &["role-read"])
            .route("/chat", &["chat-read"])
    }

    pub fn required_for(&self, path: &str) -> &[String] {
        self.required.get(path).map_or(&[], Vec::as_slice)
    }
}

/// Gate on top of the session context and permission resolver.
pub struct RouteGuard {
    table: RouteTable,
}

impl RouteGuard {
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    /// Evaluate a navigation to `path`.
    ///
    /// Hydration failures are logged and treated as an unauthenticated
    /// session; they never abort navigation outright.
    pub async fn evaluate<A: AuthApi>(
        &self,
        api: &A,
        session: &SessionContext,
        permissions: &PermissionResolver,
        path: &str,
    ) -> RouteDecision {
        if let Err(e) = session.hydrate(api, permissions).await {
            tracing::warn!(error = %e, "session hydration failed");
        }

        let authenticated = session.is_authenticated();
        let auth_route = path == LOGIN_ROUTE || path == REGISTER_ROUTE;

        if !authenticated {
            return if auth_route {
                RouteDecision::Allow
            } else {
                RouteDecision::Redirect(LOGIN_ROUTE)
            };
        }

        if auth_route {
            return RouteDecision::Redirect(DASHBOARD_ROUTE);
        }

        let required = self.table.required_for(path);
        if required.is_empty() || permissions.is_super_admin() {
            return RouteDecision::Allow;
        }

        let granted = required.iter().any(|slug| permissions.has_permission(slug));
        if granted {
            RouteDecision::Allow
        } else {
            tracing::debug!(path, "navigation denied");
            RouteDecision::Deny
        }
    }
}
