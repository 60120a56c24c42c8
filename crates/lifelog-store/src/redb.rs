//! Pure-Rust backing store using [`redb`](https://docs.rs/redb).
//!
//! No C dependencies, for targets where you can't cross-compile SQLite,
//! or when you want a fully Rust-native stack.
//!
//! Enable with `features = ["redb"]`.
//!
//! ```no_run
//! use lifelog_store::{BackingStore, RedbStore};
//!
//! let store = RedbStore::open("/tmp/lifelog.redb").unwrap();
//! store.set("todos", "[]").unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::notify::{ChangeHub, Subscription};
use crate::traits::{BackingStore, ChangeFeed, ContextId, Listener, StorageEvent};

const SLOTS: TableDefinition<&str, &str> = TableDefinition::new("slots");

/// A redb transaction, table or storage failure, as text.
#[derive(Debug, thiserror::Error)]
#[error("redb error: {0}")]
pub struct RedbError(String);

fn err(e: impl std::fmt::Display) -> RedbError {
    RedbError(e.to_string())
}

/// A pure-Rust backing store built on [`redb`].
///
/// All slots live in one table. Each operation runs in its own redb
/// transaction.
pub struct RedbStore {
    db: Arc<Database>,
    hub: Arc<ChangeHub>,
    context: ContextId,
}

impl RedbStore {
    /// Open `path`, creating the file if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RedbError> {
        let db = Database::create(path).map_err(err)?;
        Self::init(db)
    }

    /// A database held in memory, gone when the last handle drops.
    pub fn open_in_memory() -> Result<Self, RedbError> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(err)?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, RedbError> {
        // Ensure the table exists by opening a write txn.
        let txn = db.begin_write().map_err(err)?;
        txn.open_table(SLOTS).map_err(err)?;
        txn.commit().map_err(err)?;
        Ok(Self {
            db: Arc::new(db),
            hub: ChangeHub::new(),
            context: ContextId::next(),
        })
    }

    /// A new handle on the same database, writing as a new context.
    pub fn fork_context(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            hub: Arc::clone(&self.hub),
            context: ContextId::next(),
        }
    }

    fn publish(&self, key: &str, new_value: Option<&str>) {
        self.hub.publish(&StorageEvent {
            key: key.to_string(),
            new_value: new_value.map(str::to_string),
            origin: self.context,
        });
    }
}

impl BackingStore for RedbStore {
    type Error = RedbError;

    fn get(&self, key: &str) -> Result<Option<String>, RedbError> {
        let txn = self.db.begin_read().map_err(err)?;
        let table = txn.open_table(SLOTS).map_err(err)?;
        let value = table.get(key).map_err(err)?.map(|g| g.value().to_string());
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), RedbError> {
        let txn = self.db.begin_write().map_err(err)?;
        let previous = {
            let mut table = txn.open_table(SLOTS).map_err(err)?;
            let old = table
                .insert(key, value)
                .map_err(err)?
                .map(|g| g.value().to_string());
            old
        };
        txn.commit().map_err(err)?;

        if previous.as_deref() != Some(value) {
            self.publish(key, Some(value));
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), RedbError> {
        let txn = self.db.begin_write().map_err(err)?;
        let existed = {
            let mut table = txn.open_table(SLOTS).map_err(err)?;
            let old = table.remove(key).map_err(err)?.is_some();
            old
        };
        txn.commit().map_err(err)?;

        if existed {
            self.publish(key, None);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, RedbError> {
        let txn = self.db.begin_read().map_err(err)?;
        let table = txn.open_table(SLOTS).map_err(err)?;
        let mut keys = Vec::new();
        for item in table.iter().map_err(err)? {
            let (key, _) = item.map_err(err)?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }

    fn context(&self) -> ContextId {
        self.context
    }
}

impl ChangeFeed for RedbStore {
    fn subscribe(&self, listener: Listener) -> Subscription {
        self.hub.subscribe(self.context, listener)
    }
}
