use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::notify::Subscription;

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

/// Identity of one execution context (a tab, a window, a process handle)
/// sharing a backing store.
///
/// Change events carry the context that wrote them; a context never
/// receives its own events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    /// Allocate a fresh, process-unique context id.
    pub fn next() -> Self {
        Self(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// A slot changed in another context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// The slot that changed.
    pub key: String,
    /// Its new text, or `None` when the slot was removed.
    pub new_value: Option<String>,
    /// The context that performed the write.
    pub origin: ContextId,
}

/// Callback invoked for every [`StorageEvent`] delivered to a context.
pub type Listener = Arc<dyn Fn(&StorageEvent) + Send + Sync>;

/// Durable text key/value storage shared by all contexts of one origin.
///
/// Each slot holds one UTF-8 string. Operations on a single slot are
/// atomic; there are no multi-slot transactions. Writes may fail, e.g.
/// when a quota is exceeded.
///
/// Every backend implements this trait. Handles take `&self` so they can
/// be shared behind an `Arc` by several collections at once.
pub trait BackingStore: Send + Sync {
    /// Error type for this backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read a slot. `None` if it was never written or was removed.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Replace the contents of a slot.
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Remove a slot. Removing a missing slot is not an error.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;

    /// All slot keys, sorted.
    fn keys(&self) -> Result<Vec<String>, Self::Error>;

    /// The context this handle writes as.
    fn context(&self) -> ContextId;
}

/// Extension trait for backends that tell a context about writes made by
/// other contexts.
///
/// A listener registered through a handle receives an event for every
/// slot change made through any *other* handle of the same store, after
/// the write has committed. Dropping the returned [`Subscription`]
/// unregisters the listener.
pub trait ChangeFeed: BackingStore {
    /// Register a listener for changes made elsewhere.
    fn subscribe(&self, listener: Listener) -> Subscription;
}

impl<S: BackingStore + ?Sized> BackingStore for Arc<S> {
    type Error = S::Error;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, Self::Error> {
        (**self).keys()
    }

    fn context(&self) -> ContextId {
        (**self).context()
    }
}

impl<S: ChangeFeed + ?Sized> ChangeFeed for Arc<S> {
    fn subscribe(&self, listener: Listener) -> Subscription {
        (**self).subscribe(listener)
    }
}
