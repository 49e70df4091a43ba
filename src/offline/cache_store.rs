use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::CacheError;
use crate::platform::network::Response;

/// Named stores of cached responses, keyed by request URL
pub trait CacheStorage: Send + Sync {
    /// Create the named store if it does not exist
    fn open(&self, name: &str) -> Result<(), CacheError>;

    /// Names of every existing store
    fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Remove a store and its entries; false if it did not exist
    fn delete(&self, name: &str) -> Result<bool, CacheError>;

    fn match_url(&self, name: &str, url: &str) -> Result<Option<Response>, CacheError>;

    fn put(&self, name: &str, url: &str, response: &Response) -> Result<(), CacheError>;
}

/// Cache stores kept in the application's SQLite database
pub struct SqliteCacheStorage {
    conn: Mutex<Connection>,
}

impl SqliteCacheStorage {
    pub fn open_path(db_path: &Path) -> Result<Self, CacheError> {
        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn in_memory() -> Result<Self, CacheError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CacheError> {
        // Store names
        conn.execute(
            "CREATE TABLE IF NOT EXISTS caches (
                name        TEXT PRIMARY KEY
            )",
            [],
        )?;

        // Cached responses per store
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                cache_name  TEXT NOT NULL,
                url         TEXT NOT NULL,
                status      INTEGER NOT NULL,
                headers     TEXT NOT NULL,
                body        BLOB NOT NULL,
                PRIMARY KEY (cache_name, url)
            )",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }
}

impl CacheStorage for SqliteCacheStorage {
    fn open(&self, name: &str) -> Result<(), CacheError> {
        self.lock()?
            .execute("INSERT OR IGNORE INTO caches (name) VALUES (?1)", [name])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM cache_entries WHERE cache_name = ?1", [name])?;
        let removed = tx.execute("DELETE FROM caches WHERE name = ?1", [name])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn match_url(&self, name: &str, url: &str) -> Result<Option<Response>, CacheError> {
        let row: Option<(u16, String, Vec<u8>)> = self
            .lock()?
            .query_row(
                "SELECT status, headers, body FROM cache_entries
                 WHERE cache_name = ?1 AND url = ?2",
                params![name, url],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        match row {
            Some((status, headers, body)) => Ok(Some(Response {
                status,
                headers: serde_json::from_str(&headers)?,
                body,
            })),
            None => Ok(None),
        }
    }

    fn put(&self, name: &str, url: &str, response: &Response) -> Result<(), CacheError> {
        let headers = serde_json::to_string(&response.headers)?;
        let conn = self.lock()?;
        conn.execute("INSERT OR IGNORE INTO caches (name) VALUES (?1)", [name])?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (cache_name, url, status, headers, body)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![name, url, response.status, headers, response.body],
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteCacheStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCacheStorage").finish()
    }
}
