//! Key-value progress storage backed by SQLite.

use crate::db::error::DbError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use vocab_core::{KeyValueStore, StoreResult};

type Result<T> = std::result::Result<T, DbError>;

/// SQLite implementation of [`KeyValueStore`].
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(super::schema::SCHEMA)?;
        conn.execute_batch(super::schema::INIT_SCHEMA_VERSION)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.conn()?;
        let version = conn.query_row(
            "SELECT version FROM schema_version WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(version)
    }

    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() {
            return Err(DbError::InvalidData("empty key".to_string()));
        }
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn remove_value(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Keys starting with `prefix`, sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT key FROM kv_store WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.get_value(key)?)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        Ok(self.set_value(key, value)?)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        Ok(self.remove_value(key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use vocab_core::ProgressStore;

    #[test]
    fn test_open_in_memory() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.schema_version().unwrap(), 1);
        assert_eq!(store.get_value("missing").unwrap(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set_value("streak", "1").unwrap();
        store.set_value("streak", "2").unwrap();
        assert_eq!(store.get_value("streak").unwrap(), Some("2".to_string()));
    }

    #[test]
    fn test_remove() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set_value("streak", "3").unwrap();
        store.remove_value("streak").unwrap();
        store.remove_value("streak").unwrap();
        assert_eq!(store.get_value("streak").unwrap(), None);
    }

    #[test]
    fn test_empty_key_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(store.set_value("", "x"), Err(DbError::InvalidData(_))));
        assert!(KeyValueStore::set(&store, "", "x").is_err());
    }

    #[test]
    fn test_keys_with_prefix() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set_value("learned_tr_food", "[]").unwrap();
        store.set_value("learned_tr_animals", "[]").unwrap();
        store.set_value("streak_tr", "1").unwrap();
        assert_eq!(
            store.keys_with_prefix("learned_").unwrap(),
            vec!["learned_tr_animals".to_string(), "learned_tr_food".to_string()]
        );
    }

    #[test]
    fn test_progress_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "synora-store-test-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let today = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let ids = vec!["food_001".to_string(), "food_002".to_string()];

        {
            let progress = ProgressStore::new(SqliteStore::open(&path).unwrap());
            progress.mark_mastered_on("tr", "food", &ids, true, today);
        }

        let progress = ProgressStore::new(SqliteStore::open(&path).unwrap());
        assert_eq!(progress.mastered_words("tr", "food"), ids);
        assert_eq!(progress.words_learned_on("tr", today), 2);
        let _ = std::fs::remove_file(&path);
    }
}
