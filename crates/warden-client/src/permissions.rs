//! Effective-permission derivation and access-control checks.
//!
//! The resolver holds the session's roles and the permission set derived
//! from them, persists both (plus the super-admin flag) so a reload can
//! reconstruct state without a network round trip, and answers every
//! access-control query the guard and the UI ask.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use warden_shared::{Permission, Role};
use warden_store::{keys, Store, StoreError};

#[derive(Default)]
struct PermState {
    roles: Vec<Role>,
    /// Union of role permissions, deduplicated by id. First occurrence wins,
    /// so within a role the display order is preserved.
    permissions: Vec<Permission>,
    is_super_admin: bool,
}

/// Injectable permission context with an explicit lifecycle: populated at
/// login (or restored at process start), emptied at logout.
pub struct PermissionResolver {
    store: Arc<Store>,
    inner: Mutex<PermState>,
}

impl PermissionResolver {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            inner: Mutex::new(PermState::default()),
        }
    }

    fn inner(&self) -> MutexGuard<'_, PermState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Union of the active roles' permissions, deduplicated by id. Inactive
    /// roles contribute nothing.
    fn derive(roles: &[Role]) -> Vec<Permission> {
        let mut permissions: Vec<Permission> = Vec::new();
        for role in roles.iter().filter(|r| r.is_active) {
            for permission in &role.permissions {
                if !permissions.iter().any(|held| held.id == permission.id) {
                    permissions.push(permission.clone());
                }
            }
        }
        permissions
    }

    /// Replace the held role set, recompute the effective permission set,
    /// and persist everything under fixed keys.
    pub fn set_roles(&self, roles: Vec<Role>, is_super_admin: bool) -> Result<(), StoreError> {
        let permissions = Self::derive(&roles);

        self.store.set_json(keys::AUTH_ROLES, &roles)?;
        self.store.set_json(keys::AUTH_PERMISSIONS, &permissions)?;
        self.store.set_json(keys::AUTH_SUPER_ADMIN, &is_super_admin)?;

        tracing::debug!(
            roles = roles.len(),
            permissions = permissions.len(),
            is_super_admin,
            "permission set replaced"
        );

        let mut inner = self.inner();
        inner.roles = roles;
        inner.permissions = permissions;
        inner.is_super_admin = is_super_admin;
        Ok(())
    }

    /// Empty the held state and remove the persisted entries. Idempotent.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(keys::AUTH_ROLES)?;
        self.store.remove(keys::AUTH_PERMISSIONS)?;
        self.store.remove(keys::AUTH_SUPER_ADMIN)?;

        let mut inner = self.inner();
        *inner = PermState::default();
        Ok(())
    }

    /// Reconstruct state from durable storage when nothing is held in
    /// memory.
    ///
    /// The persisted role list is canonical; the flat permission list is a
    /// legacy fallback read only when no role list exists. Malformed stored
    /// values are treated as absent by the store layer, so a corrupt
    /// snapshot leaves the resolver empty rather than crashing startup.
    pub fn restore(&self) -> Result<(), StoreError> {
        if !self.inner().roles.is_empty() {
            return Ok(());
        }

        let is_super_admin: bool = self
            .store
            .get_json(keys::AUTH_SUPER_ADMIN)?
            .unwrap_or(false);

        if let Some(roles) = self.store.get_json::<Vec<Role>>(keys::AUTH_ROLES)? {
            let permissions = Self::derive(&roles);
            let mut inner = self.inner();
            inner.roles = roles;
            inner.permissions = permissions;
            inner.is_super_admin = is_super_admin;
            tracing::debug!("permissions restored from role list");
            return Ok(());
        }

        // Legacy path: older clients persisted only the flat permission list.
        if let Some(permissions) = self
            .store
            .get_json::<Vec<Permission>>(keys::AUTH_PERMISSIONS)?
        {
            let mut inner = self.inner();
            inner.permissions = permissions;
            inner.is_super_admin = is_super_admin;
            tracing::debug!("permissions restored from legacy flat list");
        }
        Ok(())
    }

    /// True unconditionally for super-admins; otherwise true iff some held
    /// permission has a matching slug and is active.
    pub fn has_permission(&self, slug: &str) -> bool {
        let inner = self.inner();
        inner.is_super_admin
            || inner
                .permissions
                .iter()
                .any(|p| p.slug == slug && p.is_active)
    }

    /// Same short-circuit, matching on resource + action instead of slug.
    pub fn can_access(&self, resource: &str, action: &str) -> bool {
        let inner = self.inner();
        inner.is_super_admin
            || inner
                .permissions
                .iter()
                .any(|p| p.resource == resource && p.action == action && p.is_active)
    }

    pub fn has_all_permissions(&self, slugs: &[&str]) -> bool {
        if self.inner().is_super_admin {
            return true;
        }
        slugs.iter().all(|slug| self.has_permission(slug))
    }

    pub fn has_any_permission(&self, slugs: &[&str]) -> bool {
        if self.inner().is_super_admin {
            return true;
        }
        slugs.iter().any(|slug| self.has_permission(slug))
    }

    /// Exact name match against the held roles.
    pub fn has_role(&self, name: &str) -> bool {
        self.inner().roles.iter().any(|r| r.name == name)
    }

    pub fn is_super_admin(&self) -> bool {
        self.inner().is_super_admin
    }

    /// Snapshot of the effective permission set.
    pub fn effective_permissions(&self) -> Vec<Permission> {
        self.inner().permissions.clone()
    }

    /// Snapshot of the held roles.
    pub fn roles(&self) -> Vec<Role> {
        self.inner().roles.clone()
    }
}
