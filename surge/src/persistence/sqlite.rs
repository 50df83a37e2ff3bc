//! SQLite-backed key-value store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, Result as SqlResult};

use super::{KeyValueStore, StoreError, StoreResult};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = SqliteStore {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteStore {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    fn get_conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| StoreError::Lock(e.to_string()))
    }

    fn initialize(&self) -> StoreResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?")?;
        let result = stmt
            .query_row(params![key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(result)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM kv WHERE key = ?", params![key])?;
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(keys)
    }

    fn clear(&self) -> StoreResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM kv", [])?;
        Ok(())
    }
}

// Helper trait for optional query results
trait OptionalResult<T> {
    fn optional(self) -> SqlResult<Option<T>>;
}

impl<T> OptionalResult<T> for SqlResult<T> {
    fn optional(self) -> SqlResult<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (SqliteStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("surge.db");
        let store = SqliteStore::open(&path).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_set_get_overwrite() {
        let (store, _temp) = create_test_store();
        store.set("modes", "[]").unwrap();
        store.set("modes", "[1]").unwrap();
        assert_eq!(store.get("modes").unwrap(), Some("[1]".to_string()));
        assert!(store.get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_keys_remove_clear() {
        let (store, _temp) = create_test_store();
        store.set("model_b", "{}").unwrap();
        store.set("model_a", "{}").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["model_a", "model_b"]);

        store.remove("model_a").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["model_b"]);

        store.clear().unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("surge.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.set("components", "[]").unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("components").unwrap(), Some("[]".to_string()));
    }

    #[test]
    fn test_in_memory() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
    }
}
