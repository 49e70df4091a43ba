use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::error::StorageError;

/// Local string key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Write `new` only if the current value equals `expected`
    /// (`None` = key absent). Returns false when another writer got there first.
    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StorageError>;
}

/// SQLite-backed key-value table
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
    /// Largest value accepted, in bytes
    quota_bytes: Option<usize>,
}

impl SqliteStore {
    /// Open or create the store at `db_path`
    pub fn open(db_path: &Path, quota_bytes: Option<usize>) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Unavailable(format!("{}: {}", parent.display(), e)))?;
        }

        let conn = Connection::open(db_path)?;
        info!("📁 Key-value store at: {}", db_path.display());

        let store = SqliteStore {
            conn: Mutex::new(conn),
            db_path: Some(db_path.to_path_buf()),
            quota_bytes,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Throwaway store for tests and ephemeral sessions
    pub fn in_memory(quota_bytes: Option<usize>) -> Result<Self, StorageError> {
        let store = SqliteStore {
            conn: Mutex::new(Connection::open_in_memory()?),
            db_path: None,
            quota_bytes,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        self.lock()?.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key     TEXT PRIMARY KEY,
                value   TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))
    }

    fn check_quota(&self, value: &str) -> Result<(), StorageError> {
        match self.quota_bytes {
            Some(limit) if value.len() > limit => Err(StorageError::QuotaExceeded {
                needed: value.len(),
                limit,
            }),
            _ => Ok(()),
        }
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .lock()?
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_quota(value)?;
        self.lock()?.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StorageError> {
        self.check_quota(new)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current: Option<String> = tx
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;

        if current.as_deref() != expected {
            return Ok(false);
        }

        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, new],
        )?;
        tx.commit()?;
        Ok(true)
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .field("quota_bytes", &self.quota_bytes)
            .finish()
    }
}
