//! Storage connection management.
//!
//! The [`Store`] struct owns a [`rusqlite::Connection`] behind a mutex so it
//! can be shared across the async tasks of the client core, and guarantees
//! the key/value schema exists before any other operation.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// Durable key/value store holding JSON snapshots.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the default application store.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/warden/warden.db`
    /// - macOS:   `~/Library/Application Support/com.warden.warden/warden.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\warden\warden\data\warden.db`
    pub fn open_default() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "warden", "warden").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("warden.db");

        tracing::info!(path = %db_path.display(), "opening store");

        Self::open_at(&db_path)
    }

    /// Open (or create) a store at an explicit path.
    ///
    /// Useful for tests and for embedding the store inside custom directory
    /// layouts.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an ephemeral in-memory store. Nothing survives the process.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                 key   TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serialize `value` as JSON and store it under `key`, replacing any
    /// previous value.
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.conn().execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, json],
        )?;
        Ok(())
    }

    /// Read and deserialize the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent *or* when the stored value
    /// is not valid JSON for `T` — a corrupt snapshot must never take down
    /// initialization, so it is logged and treated as absent.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding malformed stored value");
                Ok(None)
            }
        }
    }

    /// Remove the value stored under `key`. Idempotent.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn().path().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let store = Store::open_at(&path).expect("should open");
        assert!(store.path().is_some());

        store.set_json("k", &vec![1u32, 2, 3]).unwrap();
        let got: Option<Vec<u32>> = store.get_json("k").unwrap();
        assert_eq!(got, Some(vec![1, 2, 3]));
    }

    #[test]
    fn set_replaces_previous_value() {
        let store = Store::open_in_memory().unwrap();
        store.set_json("k", &"first").unwrap();
        store.set_json("k", &"second").unwrap();
        let got: Option<String> = store.get_json("k").unwrap();
        assert_eq!(got.as_deref(), Some("second"));
    }

    #[test]
    fn malformed_value_treated_as_absent() {
        let store = Store::open_in_memory().unwrap();
        store
            .conn()
            .execute(
                "INSERT INTO kv (key, value) VALUES ('bad', 'not json at all{')",
                [],
            )
            .unwrap();

        let got: Option<Vec<String>> = store.get_json("bad").unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn remove_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        store.set_json("k", &1u8).unwrap();
        assert!(store.remove("k").unwrap());
        assert!(!store.remove("k").unwrap());
    }
}
