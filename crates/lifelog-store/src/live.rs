//! Live views over a slot.
//!
//! A [`LiveQuery`] holds the latest snapshot of a collection or of the
//! settings. It starts out loading, reads once on activation, and reads
//! again whenever another context changes the slot it watches or when
//! [`LiveQuery::refetch`] is called. Deactivating (dropping) it removes its
//! change listener.

use std::sync::Arc;

use lifelog::{Record, UserSettings};
use parking_lot::Mutex;
use tracing::debug;

use crate::collection::Collection;
use crate::migrating::MigratingCollection;
use crate::notify::Subscription;
use crate::settings::SettingsStore;
use crate::traits::{BackingStore, ChangeFeed, StorageEvent};

/// Something a [`LiveQuery`] can watch: a slot and a way to read it.
pub trait Query: Send + Sync + 'static {
    /// What one read yields.
    type Snapshot: Clone + Default + Send + 'static;

    /// The slot whose changes trigger a re-read.
    fn key(&self) -> &str;

    /// Read the slot now.
    fn fetch(&self) -> Self::Snapshot;
}

impl<T: Record, S: BackingStore + 'static> Query for Collection<T, S> {
    type Snapshot = Vec<T>;

    fn key(&self) -> &str {
        Collection::key(self)
    }

    fn fetch(&self) -> Vec<T> {
        self.get_all()
    }
}

impl<T: Record, S: BackingStore + 'static> Query for MigratingCollection<T, S> {
    type Snapshot = Vec<T>;

    fn key(&self) -> &str {
        MigratingCollection::key(self)
    }

    fn fetch(&self) -> Vec<T> {
        self.get_all()
    }
}

impl<S: BackingStore + 'static> Query for SettingsStore<S> {
    type Snapshot = UserSettings;

    fn key(&self) -> &str {
        SettingsStore::key(self)
    }

    fn fetch(&self) -> UserSettings {
        self.get()
    }
}

/// Whether a [`LiveQuery`] has completed its first read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No read has completed yet.
    Loading,
    /// At least one read has completed.
    Ready,
}

struct State<T> {
    snapshot: T,
    phase: Phase,
    generation: u64,
}

/// A snapshot of a [`Query`] kept current with changes from other
/// contexts.
///
/// # Example
///
/// ```
/// use lifelog::{Todo, TodoDraft};
/// use lifelog_store::{Collection, LiveQuery, MemoryStore};
/// use std::sync::Arc;
///
/// let tab_a = Arc::new(MemoryStore::new());
/// let tab_b = Arc::new(tab_a.fork_context());
///
/// let live = LiveQuery::activate(Collection::<Todo, _>::new(Arc::clone(&tab_a)), &*tab_a);
/// assert!(live.snapshot().is_empty());
///
/// Collection::<Todo, _>::new(tab_b).create(TodoDraft::new("Call mom")).unwrap();
/// assert_eq!(live.snapshot()[0].text, "Call mom");
/// ```
pub struct LiveQuery<Q: Query> {
    query: Arc<Q>,
    state: Arc<Mutex<State<Q::Snapshot>>>,
    _subscription: Subscription,
}

impl<Q: Query> LiveQuery<Q> {
    /// Subscribe to changes without reading yet. The query stays
    /// [`Phase::Loading`] until the first [`LiveQuery::refetch`] or change
    /// event.
    pub fn pending<F: ChangeFeed + ?Sized>(query: Q, feed: &F) -> Self {
        let query = Arc::new(query);
        let state = Arc::new(Mutex::new(State {
            snapshot: Default::default(),
            phase: Phase::Loading,
            generation: 0,
        }));

        let subscription = {
            let query = Arc::clone(&query);
            let state = Arc::clone(&state);
            feed.subscribe(Arc::new(move |event: &StorageEvent| {
                if event.key != query.key() {
                    return;
                }
                debug!(key = %event.key, origin = %event.origin, "slot changed elsewhere, re-reading");
                refresh(&*query, &state);
            }))
        };

        Self {
            query,
            state,
            _subscription: subscription,
        }
    }

    /// Subscribe to changes and perform the first read.
    pub fn activate<F: ChangeFeed + ?Sized>(query: Q, feed: &F) -> Self {
        let live = Self::pending(query, feed);
        live.refetch();
        live
    }

    /// Re-read the slot now.
    pub fn refetch(&self) {
        refresh(&*self.query, &self.state);
    }

    /// The latest snapshot. Empty while loading.
    pub fn snapshot(&self) -> Q::Snapshot {
        self.state.lock().snapshot.clone()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    /// True until the first read completes.
    pub fn is_loading(&self) -> bool {
        self.phase() == Phase::Loading
    }

    /// Number of completed reads.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// The watched query.
    pub fn query(&self) -> &Q {
        &self.query
    }

    /// Stop listening for changes.
    pub fn deactivate(self) {}
}

// Reads outside the state lock: a fetch may write back a migration,
// which publishes to other listeners.
fn refresh<Q: Query>(query: &Q, state: &Mutex<State<Q::Snapshot>>) {
    let snapshot = query.fetch();
    let mut state = state.lock();
    state.snapshot = snapshot;
    state.phase = Phase::Ready;
    state.generation += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use lifelog::{Todo, TodoDraft};

    #[test]
    fn pending_then_ready() {
        let store = Arc::new(MemoryStore::new());
        let live = LiveQuery::pending(Collection::<Todo, _>::new(Arc::clone(&store)), &*store);
        assert!(live.is_loading());
        assert_eq!(live.generation(), 0);

        live.refetch();
        assert_eq!(live.phase(), Phase::Ready);
        assert_eq!(live.generation(), 1);
    }

    #[test]
    fn own_writes_need_refetch() {
        let store = Arc::new(MemoryStore::new());
        let todos = Collection::<Todo, _>::new(Arc::clone(&store));
        let live = LiveQuery::activate(todos.clone(), &*store);

        todos.create(TodoDraft::new("local")).unwrap();
        assert!(live.snapshot().is_empty());
        live.refetch();
        assert_eq!(live.snapshot().len(), 1);
    }

    #[test]
    fn other_keys_are_ignored() {
        let a = Arc::new(MemoryStore::new());
        let b = a.fork_context();
        let live = LiveQuery::activate(Collection::<Todo, _>::new(Arc::clone(&a)), &*a);
        b.set("links", "[]").unwrap();
        assert_eq!(live.generation(), 1);
    }

    #[test]
    fn deactivate_unsubscribes() {
        let a = Arc::new(MemoryStore::new());
        let b = Arc::new(a.fork_context());
        let live = LiveQuery::activate(SettingsStore::new(Arc::clone(&a)), &*a);
        assert_eq!(a.listener_count(), 1);
        SettingsStore::new(Arc::clone(&b))
            .modify(|s| s.dark_mode = true)
            .unwrap();
        assert!(live.snapshot().dark_mode);
        assert_eq!(live.generation(), 2);

        live.deactivate();
        assert_eq!(a.listener_count(), 0);
        assert_eq!(b.listener_count(), 0);
        SettingsStore::new(b).modify(|s| s.dark_mode = false).unwrap();
    }
}
