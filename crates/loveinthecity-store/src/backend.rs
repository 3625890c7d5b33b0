//! Pluggable backing stores.
//!
//! [`StorageBackend`] is the raw string-to-string persistence surface the
//! [`StorageManager`](crate::StorageManager) sits on: get/set/remove/keys,
//! nothing else. Three implementations are provided:
//!
//! - [`SqliteBackend`] — durable, single `kv_items` table.
//! - [`MemoryBackend`] — process-local map, used by tests and ephemeral runs.
//! - [`NullBackend`] — always unavailable; every operation fails so the
//!   manager degrades to no-ops, mirroring an environment without storage.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Raw key-value persistence surface.
///
/// Keys arriving here are already namespaced by the manager; backends store
/// them verbatim.
pub trait StorageBackend: Send + Sync {
    /// Read the raw value stored under `key`, if any.
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete `key`. Deleting an absent key is not an error.
    fn remove_item(&self, key: &str) -> StoreResult<()>;

    /// All stored keys.
    fn keys(&self) -> StoreResult<Vec<String>>;
}

/// Shared handles are backends too; lets a caller keep a handle to the
/// backend it hands the manager.
impl<B: StorageBackend + ?Sized> StorageBackend for std::sync::Arc<B> {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        (**self).keys()
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  SQLite backend
// ═══════════════════════════════════════════════════════════════════════

/// Durable backend over a single SQLite table.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (or create) the backing database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "opening storage database");

        let conn = Connection::open(path)?;
        Self::configure(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database — useful for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Apply pragmas and create the schema.
    fn configure(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA cache_size = -8000;

             CREATE TABLE IF NOT EXISTS kv_items (
                 key   TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             );",
        )?;
        debug!("storage schema ready");
        Ok(())
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("connection mutex poisoned: {e}")))
    }
}

impl StorageBackend for SqliteBackend {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_items WHERE key = ?1",
                rusqlite::params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv_items (key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv_items WHERE key = ?1", rusqlite::params![key])?;
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM kv_items ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Memory backend
// ═══════════════════════════════════════════════════════════════════════

/// Process-local backend over a `BTreeMap` (deterministic key order).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.items
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("memory backend poisoned: {e}")))
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Null backend
// ═══════════════════════════════════════════════════════════════════════

/// A backend for environments with no storage at all.
///
/// Every operation fails with [`StoreError::Unavailable`]; the manager
/// turns that into `false`/`None` returns without panicking.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl NullBackend {
    fn unavailable() -> StoreError {
        StoreError::Unavailable("no backing store in this environment".into())
    }
}

impl StorageBackend for NullBackend {
    fn get_item(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(Self::unavailable())
    }

    fn set_item(&self, _key: &str, _value: &str) -> StoreResult<()> {
        Err(Self::unavailable())
    }

    fn remove_item(&self, _key: &str) -> StoreResult<()> {
        Err(Self::unavailable())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Err(Self::unavailable())
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(backend: &dyn StorageBackend) {
        assert_eq!(backend.get_item("a").unwrap(), None);

        backend.set_item("a", "1").unwrap();
        backend.set_item("b", "2").unwrap();
        assert_eq!(backend.get_item("a").unwrap().as_deref(), Some("1"));

        // Overwrite.
        backend.set_item("a", "3").unwrap();
        assert_eq!(backend.get_item("a").unwrap().as_deref(), Some("3"));

        assert_eq!(backend.keys().unwrap(), vec!["a", "b"]);

        backend.remove_item("a").unwrap();
        assert_eq!(backend.get_item("a").unwrap(), None);

        // Removing an absent key is fine.
        backend.remove_item("a").unwrap();
    }

    #[test]
    fn memory_backend_round_trip() {
        exercise(&MemoryBackend::new());
    }

    #[test]
    fn sqlite_backend_round_trip() {
        exercise(&SqliteBackend::open_in_memory().unwrap());
    }

    #[test]
    fn sqlite_backend_persists_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.db");

        {
            let backend = SqliteBackend::open(&path).unwrap();
            backend.set_item("k", "v").unwrap();
        }

        let backend = SqliteBackend::open(&path).unwrap();
        assert_eq!(backend.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn null_backend_always_fails() {
        let backend = NullBackend;
        assert!(backend.get_item("k").is_err());
        assert!(backend.set_item("k", "v").is_err());
        assert!(backend.remove_item("k").is_err());
        assert!(backend.keys().is_err());
    }
}
