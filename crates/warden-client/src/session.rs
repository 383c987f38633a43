//! Session lifecycle: login, logout, and lazy hydration from durable
//! storage.
//!
//! The context is injectable rather than ambient: it is created once at
//! process start, feeds the permission resolver on every principal change,
//! and is torn down at logout.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use warden_api::AuthApi;
use warden_shared::Principal;
use warden_store::{keys, Store};

use crate::error::Result;
use crate::permissions::PermissionResolver;

#[derive(Default)]
struct SessionState {
    token: Option<String>,
    principal: Option<Principal>,
    /// Set once the first restore-from-storage pass has run.
    hydrated: bool,
}

/// Holds the authenticated principal and its credential for the session's
/// duration; both are persisted across reloads.
pub struct SessionContext {
    store: Arc<Store>,
    inner: Mutex<SessionState>,
}

impl SessionContext {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            inner: Mutex::new(SessionState::default()),
        }
    }

    fn inner(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Authenticate against the backend. On success the token and principal
    /// snapshot are persisted and the resolver is fed the principal's roles.
    pub async fn login<A: AuthApi>(
        &self,
        api: &A,
        permissions: &PermissionResolver,
        email: &str,
        password: &str,
    ) -> Result<Principal> {
        let response = api.login(email, password).await?;

        api.set_token(&response.token);
        self.store.set_json(keys::SESSION_TOKEN, &response.token)?;
        self.store
            .set_json(keys::SESSION_PRINCIPAL, &response.principal)?;

        permissions.set_roles(
            response.principal.roles.clone(),
            response.principal.is_super_admin,
        )?;

        tracing::info!(principal = %response.principal.id, "logged in");

        let mut inner = self.inner();
        inner.token = Some(response.token);
        inner.principal = Some(response.principal.clone());
        inner.hydrated = true;
        Ok(response.principal)
    }

    /// End the session. The remote call is best-effort; local state and
    /// storage are cleared regardless.
    pub async fn logout<A: AuthApi>(&self, api: &A, permissions: &PermissionResolver) -> Result<()> {
        if let Err(e) = api.logout().await {
            tracing::warn!(error = %e, "remote logout failed, clearing local session anyway");
        }
        api.clear_token();

        self.store.remove(keys::SESSION_TOKEN)?;
        self.store.remove(keys::SESSION_PRINCIPAL)?;
        permissions.clear()?;

        let mut inner = self.inner();
        inner.token = None;
        inner.principal = None;
        inner.hydrated = true;

        tracing::info!("logged out");
        Ok(())
    }

    /// Lazy restoration, run as a side effect of the first route check.
    ///
    /// Loads the token and principal snapshot from durable storage, then
    /// attempts a best-effort remote identity refresh. A failed refresh
    /// keeps the snapshot; nothing here is fatal.
    pub async fn hydrate<A: AuthApi>(&self, api: &A, permissions: &PermissionResolver) -> Result<()> {
        {
            let inner = self.inner();
            if inner.hydrated {
                return Ok(());
            }
        }

        let token: Option<String> = self.store.get_json(keys::SESSION_TOKEN)?;
        let snapshot: Option<Principal> = self.store.get_json(keys::SESSION_PRINCIPAL)?;

        {
            let mut inner = self.inner();
            inner.token = token.clone();
            inner.principal = snapshot;
            inner.hydrated = true;
        }

        let Some(token) = token else {
            return Ok(());
        };
        api.set_token(&token);

        match api.current_principal().await {
            Ok(principal) => {
                self.store.set_json(keys::SESSION_PRINCIPAL, &principal)?;
                permissions.set_roles(principal.roles.clone(), principal.is_super_admin)?;
                self.inner().principal = Some(principal);
            }
            Err(e) => {
                tracing::debug!(error = %e, "identity refresh failed, keeping stored snapshot");
                permissions.restore()?;
            }
        }
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner().principal.is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.inner().token.clone()
    }

    /// Snapshot of the authenticated principal.
    pub fn principal(&self) -> Option<Principal> {
        self.inner().principal.clone()
    }
}
