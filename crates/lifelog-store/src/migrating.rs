use std::sync::Arc;

use lifelog::{Document, Record};
use lifelog_migrate::{MigrationConfig, MigrationEngine, MigrationReport};
use serde::Serialize;
use tracing::{info, warn};

use crate::codec;
use crate::collection::Collection;
use crate::error::StoreError;
use crate::traits::BackingStore;

/// A [`Collection`] whose records may still be stored in a legacy shape.
///
/// Every read runs the migration engine over the raw documents before
/// decoding them. When any record changed and
/// [`MigrationConfig::write_back_on_read`] is set, the migrated collection
/// is persisted once so later reads find nothing to do. A failed
/// write-back is logged and the migrated view is still returned.
///
/// Writes always operate on the migrated view, so `create`, `update` and
/// `delete` also persist any pending migration.
pub struct MigratingCollection<T, S> {
    inner: Collection<T, S>,
    engine: Arc<MigrationEngine>,
    config: MigrationConfig,
}

impl<T, S> Clone for MigratingCollection<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            engine: Arc::clone(&self.engine),
            config: self.config.clone(),
        }
    }
}

impl<T: Record, S: BackingStore> MigratingCollection<T, S> {
    /// Wrap the collection under the record type's own key.
    pub fn new(store: Arc<S>, engine: Arc<MigrationEngine>) -> Self {
        Self::with_config(Collection::new(store), engine, MigrationConfig::default())
    }

    /// Wrap an existing collection with explicit migration settings.
    pub fn with_config(
        inner: Collection<T, S>,
        engine: Arc<MigrationEngine>,
        config: MigrationConfig,
    ) -> Self {
        Self {
            inner,
            engine,
            config,
        }
    }

    /// The slot key.
    pub fn key(&self) -> &str {
        self.inner.key()
    }

    /// The raw slot text, as stored.
    pub fn raw(&self) -> Option<String> {
        self.inner.raw()
    }

    /// The collection without migration.
    pub fn unmigrated(&self) -> &Collection<T, S> {
        &self.inner
    }

    /// Every record in current shape, in stored order. Never fails.
    pub fn get_all(&self) -> Vec<T> {
        codec::records_from_documents(self.key(), self.read_migrated())
    }

    /// The record with `id`, in current shape.
    pub fn get_by_id(&self, id: &str) -> Option<T> {
        self.get_all().into_iter().find(|r| r.id() == id)
    }

    /// Append a new record built from `draft` with a fresh id.
    pub fn create(&self, draft: T::Draft) -> Result<T, StoreError> {
        self.inner.create_in(self.read_migrated(), draft)
    }

    /// Shallow-merge `patch` into the record with `id`. See
    /// [`Collection::update`].
    pub fn update<P: Serialize + ?Sized>(
        &self,
        id: &str,
        patch: &P,
    ) -> Result<Option<T>, StoreError> {
        self.inner.update_in(self.read_migrated(), id, patch)
    }

    /// Remove the record with `id`.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.inner.delete_in(self.read_migrated(), id)
    }

    /// Migrate the stored collection now and persist it if anything
    /// changed, regardless of `write_back_on_read`.
    pub fn migrate(&self) -> Result<MigrationReport, StoreError> {
        let raw = self.inner.raw();
        let mut docs = codec::decode_documents(self.key(), raw.as_deref());
        let report = self
            .engine
            .migrate_collection(&mut docs)
            .map_err(|source| StoreError::Migration {
                key: self.key().to_string(),
                source,
            })?;
        if report.changed() {
            self.persist(&docs)?;
        }
        Ok(report)
    }

    /// Whether any stored record still needs migration.
    pub fn needs_migration(&self) -> bool {
        let raw = self.inner.raw();
        codec::decode_documents(self.key(), raw.as_deref())
            .iter()
            .any(|doc| self.engine.needs_migration(doc))
    }

    fn read_migrated(&self) -> Vec<Document> {
        let raw = self.inner.raw();
        let mut docs = codec::decode_documents(self.key(), raw.as_deref());

        let report = match self.engine.migrate_collection(&mut docs) {
            Ok(report) => report,
            Err(e) => {
                warn!(key = self.key(), error = %e, "migration failed, reading records as stored");
                return codec::decode_documents(self.key(), raw.as_deref());
            }
        };

        if report.changed() && self.config.write_back_on_read {
            match self.persist(&docs) {
                Ok(()) => info!(
                    key = self.key(),
                    migrated = report.migrated,
                    "persisted migrated records"
                ),
                Err(e) => warn!(
                    key = self.key(),
                    error = %e,
                    "failed to persist migrated records, serving migrated view"
                ),
            }
        }
        docs
    }

    fn persist(&self, docs: &[Document]) -> Result<(), StoreError> {
        self.inner.write_documents(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use lifelog::{GoalCategory, MonthlyGoal};
    use serde_json::json;

    fn legacy_slot() -> String {
        json!([{
            "id": "g1",
            "month": "2024-01",
            "weightGoal": "Reach 65kg",
            "weightGoalCompleted": true,
            "createdAt": "2024-01-01T00:00:00.000Z"
        }])
        .to_string()
    }

    fn goals(store: &Arc<MemoryStore>, write_back: bool) -> MigratingCollection<MonthlyGoal, MemoryStore> {
        MigratingCollection::with_config(
            Collection::new(Arc::clone(store)),
            Arc::new(MigrationEngine::goal_groups()),
            MigrationConfig {
                write_back_on_read: write_back,
                eager_migration: false,
            },
        )
    }

    #[test]
    fn read_migrates_and_writes_back_once() {
        let store = Arc::new(MemoryStore::new());
        store.set("monthlyGoals", &legacy_slot()).unwrap();
        let c = goals(&store, true);

        assert!(c.needs_migration());
        let first = c.get_all();
        assert_eq!(first[0].goals.goals(GoalCategory::Weight), ["Reach 65kg"]);
        assert_eq!(first[0].goals.completed(GoalCategory::Weight), [true]);

        let stored = c.raw().unwrap();
        assert!(!stored.contains("\"weightGoal\""));
        assert!(!c.needs_migration());

        assert_eq!(c.get_all(), first);
        assert_eq!(c.raw().unwrap(), stored);
    }

    #[test]
    fn without_write_back_storage_keeps_legacy_shape() {
        let store = Arc::new(MemoryStore::new());
        store.set("monthlyGoals", &legacy_slot()).unwrap();
        let c = goals(&store, false);

        assert_eq!(c.get_all().len(), 1);
        assert_eq!(c.raw().unwrap(), legacy_slot());

        let report = c.migrate().unwrap();
        assert_eq!(report.migrated, 1);
        assert!(!c.needs_migration());
    }

    #[test]
    fn failed_write_back_still_serves_migrated_view() {
        let raw = legacy_slot();
        // Room for the legacy slot but not the longer migrated one.
        let store = Arc::new(MemoryStore::with_quota("monthlyGoals".len() + raw.len() + 4));
        store.set("monthlyGoals", &raw).unwrap();
        let c = goals(&store, true);

        let all = c.get_all();
        assert_eq!(all[0].goals.goals(GoalCategory::Weight), ["Reach 65kg"]);
        assert_eq!(c.raw().unwrap(), raw);
    }

    #[test]
    fn writes_keep_records_that_do_not_decode() {
        let store = Arc::new(MemoryStore::new());
        let slot = json!([
            {
                "id": "g1",
                "month": "2024-01",
                "todoGoal": "Read",
                "createdAt": "2024-01-01T00:00:00.000Z",
                "owner": "me"
            },
            { "id": "g2", "month": 202402, "createdAt": "2024-02-01T00:00:00.000Z" }
        ]);
        store.set("monthlyGoals", &slot.to_string()).unwrap();
        let c = goals(&store, false);
        assert_eq!(c.get_all().len(), 1);

        c.delete("missing").unwrap();
        c.update("g1", &json!({ "month": "2024-03" })).unwrap().unwrap();
        let stored: serde_json::Value = serde_json::from_str(&c.raw().unwrap()).unwrap();
        assert_eq!(stored[0]["owner"], "me");
        assert_eq!(stored[0]["todoGoals"], json!(["Read"]));
        assert_eq!(stored[1], slot[1]);
    }

    #[test]
    fn writes_persist_pending_migration() {
        let store = Arc::new(MemoryStore::new());
        store.set("monthlyGoals", &legacy_slot()).unwrap();
        let c = goals(&store, false);

        c.update("g1", &json!({ "month": "2024-02" })).unwrap().unwrap();
        assert!(!c.needs_migration());
        assert_eq!(c.get_by_id("g1").unwrap().month, "2024-02");
    }
}
