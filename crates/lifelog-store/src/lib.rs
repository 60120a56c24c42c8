//! # lifelog-store
//!
//! Local-first persistence for [`lifelog`](https://docs.rs/lifelog) records.
//!
//! Each collection is stored as one JSON array in one slot of a durable
//! text key/value store. Reads never fail: a missing or corrupt slot reads
//! as empty. Goal collections migrate legacy records on read. Handles of
//! the same store opened as different contexts (tabs, windows) are told
//! about each other's writes, and [`LiveQuery`] keeps a snapshot current
//! with them.
//!
//! ## Quick Start
//!
//! ```
//! use lifelog::TodoDraft;
//! use lifelog_store::{LocalData, MemoryStore};
//!
//! let data = LocalData::open(MemoryStore::new());
//! let todo = data.todos.create(TodoDraft::new("Buy milk")).unwrap();
//!
//! data.todos
//!     .update(&todo.id, &serde_json::json!({ "completed": true }))
//!     .unwrap();
//! assert!(data.todos.get_by_id(&todo.id).unwrap().completed);
//! ```
//!
//! ## Backends
//!
//! | Backend | Feature flag | Use case |
//! |---------|-------------|----------|
//! | [`MemoryStore`] | *(always available)* | Testing, prototyping, quota simulation |
//! | `SqliteStore` | `sqlite` | Desktop and CLI |
//! | `RedbStore` | `redb` | Pure-Rust targets without C deps |

mod codec;
mod collection;
mod db;
mod error;
mod live;
mod memory;
mod migrating;
mod notify;
#[cfg(feature = "redb")]
mod redb;
mod settings;
#[cfg(feature = "sqlite")]
mod sqlite;
mod traits;

pub use codec::{
    decode, decode_documents, decode_one, document_id, encode, encode_one, merge_patch,
    patch_document, records_from_documents, to_document,
};
pub use collection::Collection;
pub use db::{LocalData, LocalDataBuilder, SlotSummary, StoreConfig};
pub use error::{BoxError, StoreError};
pub use live::{LiveQuery, Phase, Query};
pub use memory::{MemoryError, MemoryStore};
pub use migrating::MigratingCollection;
pub use notify::{ChangeHub, Subscription};
#[cfg(feature = "redb")]
pub use redb::{RedbError, RedbStore};
pub use settings::SettingsStore;
#[cfg(feature = "sqlite")]
pub use sqlite::{JournalMode, SqliteConfig, SqliteError, SqliteStore};
pub use traits::*;

pub use lifelog_migrate::{MigrationConfig, MigrationReport};
