//! In-process change propagation between contexts.
//!
//! Every handle of a store shares one [`ChangeHub`]. A write through one
//! handle is published to the hub after it commits, and the hub calls every
//! listener registered by the *other* contexts.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

use crate::traits::{ContextId, Listener, StorageEvent};

struct Entry {
    id: u64,
    context: ContextId,
    listener: Listener,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

/// Listener registry shared by all handles of one store.
#[derive(Default)]
pub struct ChangeHub {
    registry: Mutex<Registry>,
}

impl ChangeHub {
    /// A hub with no listeners.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `listener` on behalf of `context`.
    pub fn subscribe(self: &Arc<Self>, context: ContextId, listener: Listener) -> Subscription {
        let mut registry = self.registry.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.entries.push(Entry {
            id,
            context,
            listener,
        });
        Subscription {
            hub: Arc::downgrade(self),
            id,
        }
    }

    /// Deliver `event` to every listener not registered by its origin.
    ///
    /// Listeners run on the caller's thread with no hub lock held, so a
    /// listener may itself read, write or subscribe.
    pub fn publish(&self, event: &StorageEvent) {
        let targets: Vec<Listener> = self
            .registry
            .lock()
            .entries
            .iter()
            .filter(|e| e.context != event.origin)
            .map(|e| Arc::clone(&e.listener))
            .collect();

        trace!(key = %event.key, origin = %event.origin, listeners = targets.len(), "publish");
        for listener in targets {
            listener(event);
        }
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.registry.lock().entries.len()
    }

    fn unsubscribe(&self, id: u64) {
        self.registry.lock().entries.retain(|e| e.id != id);
    }
}

/// Keeps a listener registered. Dropping it unregisters the listener.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    hub: Weak<ChangeHub>,
    id: u64,
}

impl Subscription {
    /// A subscription attached to nothing, for backends without a feed.
    pub fn detached() -> Self {
        Self {
            hub: Weak::new(),
            id: 0,
        }
    }

    /// Explicitly unregister. Same as dropping.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
