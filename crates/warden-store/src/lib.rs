//! # warden-store
//!
//! Durable client-side key/value storage for the Warden console, backed by
//! SQLite.
//!
//! The console persists small JSON snapshots between reloads: the session
//! token, the principal, the role list, the legacy flat permission list, and
//! the super-admin flag. The crate exposes a synchronous [`Store`] handle
//! wrapping a `rusqlite::Connection` with typed get/set helpers.

pub mod database;
pub mod keys;

mod error;

pub use database::Store;
pub use error::StoreError;
