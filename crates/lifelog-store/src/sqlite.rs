//! SQLite backing store using rusqlite.
//!
//! This is the primary durable backend for desktop and CLI use. Every slot
//! is one row of the `slots` table. Uses WAL mode by default.
//!
//! Handles made with [`SqliteStore::fork_context`] share one connection
//! and one change hub, so they notify each other like browser tabs do.
//! Separate processes opening the same file see each other's data but
//! receive no change events.
//!
//! # Example
//!
//! ```no_run
//! use lifelog_store::{BackingStore, SqliteStore};
//!
//! let store = SqliteStore::open("lifelog.db").unwrap();
//! store.set("todos", "[]").unwrap();
//! assert_eq!(store.get("todos").unwrap().as_deref(), Some("[]"));
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;

use crate::notify::{ChangeHub, Subscription};
use crate::traits::{BackingStore, ChangeFeed, ContextId, Listener, StorageEvent};

/// Connection settings applied when a database is opened.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Journal mode, WAL unless set.
    pub journal_mode: JournalMode,
    /// How long a write waits on a locked file, in milliseconds (5000).
    pub busy_timeout_ms: u32,
    /// Page size for new files (4096).
    pub page_size: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            journal_mode: JournalMode::Wal,
            busy_timeout_ms: 5000,
            page_size: 4096,
        }
    }
}

/// Value of `PRAGMA journal_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    /// Write-ahead log; readers do not block the writer.
    Wal,
    /// Rollback journal deleted after each transaction.
    Delete,
    /// Journal kept in memory. A crash mid-write can corrupt the file.
    Memory,
}

impl JournalMode {
    /// The pragma value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
            Self::Memory => "MEMORY",
        }
    }
}

/// Failure reported by [`SqliteStore`].
#[derive(Debug, thiserror::Error)]
pub enum SqliteError {
    /// The database rejected a statement.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Lock poisoned.
    #[error("sqlite lock poisoned")]
    LockPoisoned,
}

/// SQLite backing store.
///
/// Wraps a `rusqlite::Connection` behind a `Mutex` for shared access.
/// The `slots` table is created on first open.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    hub: Arc<ChangeHub>,
    context: ContextId,
}

impl SqliteStore {
    /// Open `path`, creating the file and the `slots` table if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteError> {
        Self::open_with_config(path, SqliteConfig::default())
    }

    /// Like [`SqliteStore::open`] with explicit connection settings.
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: SqliteConfig,
    ) -> Result<Self, SqliteError> {
        let conn = Connection::open(path)?;
        Self::init_connection(&conn, &config)?;
        Self::create_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    /// A private database that lives as long as the handle and its forks.
    pub fn open_in_memory() -> Result<Self, SqliteError> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(&conn, &SqliteConfig::default())?;
        Self::create_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            hub: ChangeHub::new(),
            context: ContextId::next(),
        }
    }

    /// A new handle on the same database, writing as a new context.
    pub fn fork_context(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            hub: Arc::clone(&self.hub),
            context: ContextId::next(),
        }
    }

    fn init_connection(conn: &Connection, config: &SqliteConfig) -> Result<(), SqliteError> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = {};
             PRAGMA busy_timeout = {};
             PRAGMA page_size = {};
             PRAGMA synchronous = NORMAL;",
            config.journal_mode.as_str(),
            config.busy_timeout_ms,
            config.page_size,
        ))?;
        Ok(())
    }

    fn create_schema(conn: &Connection) -> Result<(), SqliteError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS slots (
                key         TEXT PRIMARY KEY NOT NULL,
                value       TEXT NOT NULL,
                updated_at  INTEGER NOT NULL DEFAULT 0
            );",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteError> {
        self.conn.lock().map_err(|_| SqliteError::LockPoisoned)
    }

    fn now_ms() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    /// Milliseconds since the epoch of the last write to `key`.
    pub fn updated_at(&self, key: &str) -> Result<Option<u64>, SqliteError> {
        let conn = self.lock()?;
        let ms: Option<i64> = conn
            .query_row(
                "SELECT updated_at FROM slots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(ms.map(|v| v as u64))
    }

    /// Bytes used by the database, from its page count.
    pub fn file_size(&self) -> Result<u64, SqliteError> {
        let conn = self.lock()?;
        let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
        let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
        Ok((page_count * page_size) as u64)
    }

    /// Journal mode reported by SQLite, lowercase.
    pub fn journal_mode(&self) -> Result<String, SqliteError> {
        let conn = self.lock()?;
        let mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
        Ok(mode)
    }
}

impl BackingStore for SqliteStore {
    type Error = SqliteError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        let changed = {
            let conn = self.lock()?;
            conn.execute(
                "INSERT INTO slots (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key)
                 DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                 WHERE slots.value IS NOT excluded.value",
                params![key, value, Self::now_ms() as i64],
            )?
        };
        if changed > 0 {
            self.hub.publish(&StorageEvent {
                key: key.to_string(),
                new_value: Some(value.to_string()),
                origin: self.context,
            });
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        let removed = {
            let conn = self.lock()?;
            conn.execute("DELETE FROM slots WHERE key = ?1", params![key])?
        };
        if removed > 0 {
            self.hub.publish(&StorageEvent {
                key: key.to_string(),
                new_value: None,
                origin: self.context,
            });
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, Self::Error> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM slots ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    fn context(&self) -> ContextId {
        self.context
    }
}

impl ChangeFeed for SqliteStore {
    fn subscribe(&self, listener: Listener) -> Subscription {
        self.hub.subscribe(self.context, listener)
    }
}
