//! SQLite-backed store.
//!
//! Every document is one row of `docs(key TEXT PRIMARY KEY, value BLOB)`,
//! keyed by the [`StoreKey`] display form (`owner/<id>`, `resource/<id>`,
//! `journal`). Keys compare byte-wise, so ids differing only in case stay
//! distinct. The database runs in WAL mode with `synchronous = FULL`: a
//! `put` that returned is on disk.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use super::{Store, StoreError, StoreKey};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS docs (
        key TEXT PRIMARY KEY,
        value BLOB NOT NULL
    );
"#;

/// Store keeping every document in one SQLite table.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    /// Private in-memory database; contents vanish on drop.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        // Reports the resulting mode; in-memory databases stay "memory".
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of stored documents.
    pub fn len(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM docs", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl Store for SqliteStore {
    fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let value = conn
            .query_row(
                "SELECT value FROM docs WHERE key = ?1",
                params![key.to_string()],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &StoreKey, value: &[u8]) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO docs (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key.to_string(), value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &StoreKey) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute("DELETE FROM docs WHERE key = ?1", params![key.to_string()])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_store_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let key = StoreKey::Resource("lab/1".into());

        assert!(store.get(&key).unwrap().is_none());
        store.put(&key, br#"{"a":1}"#).unwrap();
        store.put(&key, br#"{"a":2}"#).unwrap();
        assert_eq!(store.get(&key).unwrap().unwrap(), br#"{"a":2}"#.to_vec());
        assert_eq!(store.len().unwrap(), 1);

        store.delete(&key).unwrap();
        store.delete(&key).unwrap();
        assert!(store.get(&key).unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_ids_differing_in_case_stay_apart() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put(&StoreKey::Resource("F1".into()), b"upper").unwrap();
        store.put(&StoreKey::Resource("f1".into()), b"lower").unwrap();

        assert_eq!(
            store.get(&StoreKey::Resource("F1".into())).unwrap().unwrap(),
            b"upper".to_vec()
        );
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_namespaces_stay_apart() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put(&StoreKey::Owner("L1".into()), b"venue").unwrap();
        store.put(&StoreKey::Resource("L1".into()), b"lab").unwrap();
        store.put(&StoreKey::Journal, b"{}").unwrap();

        assert_eq!(store.get(&StoreKey::Owner("L1".into())).unwrap().unwrap(), b"venue".to_vec());
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn test_sqlite_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timetable.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.put(&StoreKey::Journal, b"[]").unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.get(&StoreKey::Journal).unwrap().unwrap(), b"[]".to_vec());
    }
}
