use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::notify::{ChangeHub, Subscription};
use crate::traits::{BackingStore, ChangeFeed, ContextId, Listener, StorageEvent};

/// In-memory backing store.
///
/// All slots live in a `BTreeMap` — nothing touches disk. Handles created
/// with [`MemoryStore::fork_context`] share the slots and see each other's
/// writes through [`ChangeFeed`], the way browser tabs share one origin.
///
/// # Example
///
/// ```
/// use lifelog_store::{BackingStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.set("todos", "[]").unwrap();
/// assert_eq!(store.get("todos").unwrap().as_deref(), Some("[]"));
///
/// let other_tab = store.fork_context();
/// assert_eq!(other_tab.get("todos").unwrap().as_deref(), Some("[]"));
/// ```
pub struct MemoryStore {
    shared: Arc<Shared>,
    context: ContextId,
}

struct Shared {
    slots: Mutex<BTreeMap<String, String>>,
    hub: Arc<ChangeHub>,
    /// Byte budget over all keys and values.
    quota: Option<usize>,
}

/// Error type for the in-memory backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// The write would take the store over its byte budget.
    #[error("quota exceeded writing {key}: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },
}

impl MemoryStore {
    /// Create a new empty store without a quota.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a store whose keys and values together may not exceed
    /// `bytes`. Writes that would exceed it fail with
    /// [`MemoryError::QuotaExceeded`] and leave the slot untouched.
    pub fn with_quota(bytes: usize) -> Self {
        Self::build(Some(bytes))
    }

    fn build(quota: Option<usize>) -> Self {
        Self {
            shared: Arc::new(Shared {
                slots: Mutex::new(BTreeMap::new()),
                hub: ChangeHub::new(),
                quota,
            }),
            context: ContextId::next(),
        }
    }

    /// A new handle on the same slots, writing as a new context.
    pub fn fork_context(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            context: ContextId::next(),
        }
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.shared.slots.lock().len()
    }

    /// Listeners registered through any handle of this store.
    pub fn listener_count(&self) -> usize {
        self.shared.hub.listener_count()
    }

    /// Bytes held by all keys and values.
    pub fn used_bytes(&self) -> usize {
        used(&self.shared.slots.lock())
    }
}

fn used(slots: &BTreeMap<String, String>) -> usize {
    slots.iter().map(|(k, v)| k.len() + v.len()).sum()
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BackingStore for MemoryStore {
    type Error = MemoryError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.shared.slots.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        {
            let mut slots = self.shared.slots.lock();
            let previous = slots.get(key);
            if previous.map(String::as_str) == Some(value) {
                return Ok(());
            }
            if let Some(quota) = self.shared.quota {
                let freed = previous.map_or(0, |v| key.len() + v.len());
                let needed = used(&slots) - freed + key.len() + value.len();
                if needed > quota {
                    return Err(MemoryError::QuotaExceeded {
                        key: key.to_string(),
                        needed,
                        quota,
                    });
                }
            }
            slots.insert(key.to_string(), value.to_string());
        }

        self.shared.hub.publish(&StorageEvent {
            key: key.to_string(),
            new_value: Some(value.to_string()),
            origin: self.context,
        });
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        let existed = self.shared.slots.lock().remove(key).is_some();
        if existed {
            self.shared.hub.publish(&StorageEvent {
                key: key.to_string(),
                new_value: None,
                origin: self.context,
            });
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.shared.slots.lock().keys().cloned().collect())
    }

    fn context(&self) -> ContextId {
        self.context
    }
}

impl ChangeFeed for MemoryStore {
    fn subscribe(&self, listener: Listener) -> Subscription {
        self.shared.hub.subscribe(self.context, listener)
    }
}
