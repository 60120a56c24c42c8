//! The full set of lifelog collections over one backing store.
//!
//! ```
//! use lifelog::TodoDraft;
//! use lifelog_store::{LocalData, MemoryStore};
//!
//! let data = LocalData::open(MemoryStore::new());
//! data.todos.create(TodoDraft::new("Buy milk")).unwrap();
//! assert_eq!(data.todos.get_all().len(), 1);
//! assert!(!data.settings.get().dark_mode);
//! ```

use std::sync::Arc;

use lifelog::{
    DailyRoutine, DiaryEntry, Link, MealRecord, MonthlyGoal, Record, Schedule, SleepRecord, Todo,
    WeeklyGoal, WeightRecord, COLLECTION_KEYS, SETTINGS_KEY,
};
use lifelog_migrate::{MigrationConfig, MigrationEngine, MigrationReport, MigrationStep};
use tracing::{info, warn};

use crate::codec;
use crate::collection::Collection;
use crate::error::StoreError;
use crate::migrating::MigratingCollection;
use crate::settings::SettingsStore;
use crate::traits::BackingStore;

/// Configuration for [`LocalData`].
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Migration behavior of the goal collections.
    pub migration: MigrationConfig,
}

/// What one slot holds, for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSummary {
    /// Slot key.
    pub key: String,
    /// Whether the slot exists.
    pub present: bool,
    /// Length of the stored text.
    pub bytes: usize,
    /// Number of record objects, for collection slots.
    pub records: Option<usize>,
}

/// Every collection and the settings, sharing one backing store handle.
///
/// Each field is an independent handle; clone one to hand it to a
/// [`LiveQuery`](crate::LiveQuery).
pub struct LocalData<S: BackingStore> {
    store: Arc<S>,
    config: StoreConfig,
    pub todos: Collection<Todo, S>,
    pub schedules: Collection<Schedule, S>,
    pub sleep_records: Collection<SleepRecord, S>,
    pub weight_records: Collection<WeightRecord, S>,
    pub meal_records: Collection<MealRecord, S>,
    pub diary_entries: Collection<DiaryEntry, S>,
    pub daily_routines: Collection<DailyRoutine, S>,
    pub monthly_goals: MigratingCollection<MonthlyGoal, S>,
    pub weekly_goals: MigratingCollection<WeeklyGoal, S>,
    pub links: Collection<Link, S>,
    pub settings: SettingsStore<S>,
}

/// Builder for constructing a [`LocalData`] with custom configuration.
pub struct LocalDataBuilder<S: BackingStore> {
    store: Arc<S>,
    config: StoreConfig,
    engine: MigrationEngine,
}

impl<S: BackingStore> LocalDataBuilder<S> {
    /// Set the migration configuration.
    pub fn migration_config(mut self, config: MigrationConfig) -> Self {
        self.config.migration = config;
        self
    }

    /// Register an extra migration step for the goal collections. It runs
    /// after the built-in goal steps.
    pub fn register_migration(mut self, step: Box<dyn MigrationStep>) -> Self {
        self.engine.register(step);
        self
    }

    /// Build the bundle. With `eager_migration` set, the goal collections
    /// are migrated now; failures are logged and retried on read.
    pub fn build(self) -> LocalData<S> {
        let engine = Arc::new(self.engine);
        let store = self.store;
        let monthly_goals = migrating(&store, &engine, &self.config.migration);
        let weekly_goals = migrating(&store, &engine, &self.config.migration);

        let data = LocalData {
            todos: Collection::new(Arc::clone(&store)),
            schedules: Collection::new(Arc::clone(&store)),
            sleep_records: Collection::new(Arc::clone(&store)),
            weight_records: Collection::new(Arc::clone(&store)),
            meal_records: Collection::new(Arc::clone(&store)),
            diary_entries: Collection::new(Arc::clone(&store)),
            daily_routines: Collection::new(Arc::clone(&store)),
            monthly_goals,
            weekly_goals,
            links: Collection::new(Arc::clone(&store)),
            settings: SettingsStore::new(Arc::clone(&store)),
            config: self.config,
            store,
        };

        if data.config.migration.eager_migration {
            if let Err(e) = data.migrate_all() {
                warn!(error = %e, "eager migration failed");
            }
        }
        data
    }
}

fn migrating<T: Record, S: BackingStore>(
    store: &Arc<S>,
    engine: &Arc<MigrationEngine>,
    config: &MigrationConfig,
) -> MigratingCollection<T, S> {
    MigratingCollection::with_config(
        Collection::new(Arc::clone(store)),
        Arc::clone(engine),
        config.clone(),
    )
}

impl<S: BackingStore> LocalData<S> {
    /// Open every collection over `store` with default configuration.
    pub fn open(store: S) -> Self {
        Self::builder(store).build()
    }

    /// Create a builder for advanced configuration.
    pub fn builder(store: S) -> LocalDataBuilder<S> {
        Self::builder_shared(Arc::new(store))
    }

    /// Like [`LocalData::builder`] for a store handle that is already shared.
    pub fn builder_shared(store: Arc<S>) -> LocalDataBuilder<S> {
        LocalDataBuilder {
            store,
            config: StoreConfig::default(),
            engine: MigrationEngine::goal_groups(),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The active configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Migrate both goal collections now. Returns the monthly and weekly
    /// reports.
    pub fn migrate_all(&self) -> Result<(MigrationReport, MigrationReport), StoreError> {
        let monthly = self.monthly_goals.migrate()?;
        let weekly = self.weekly_goals.migrate()?;
        if monthly.changed() || weekly.changed() {
            info!(
                monthly = monthly.migrated,
                weekly = weekly.migrated,
                "migrated goal collections"
            );
        }
        Ok((monthly, weekly))
    }

    /// One summary per known slot, collections first, then settings.
    pub fn slot_summaries(&self) -> Vec<SlotSummary> {
        let mut out = Vec::with_capacity(COLLECTION_KEYS.len() + 1);
        for key in COLLECTION_KEYS {
            let raw = self.read(key);
            out.push(SlotSummary {
                key: key.to_string(),
                present: raw.is_some(),
                bytes: raw.as_ref().map_or(0, String::len),
                records: Some(codec::decode_documents(key, raw.as_deref()).len()),
            });
        }
        let raw = self.read(SETTINGS_KEY);
        out.push(SlotSummary {
            key: SETTINGS_KEY.to_string(),
            present: raw.is_some(),
            bytes: raw.as_ref().map_or(0, String::len),
            records: None,
        });
        out
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "failed to read slot");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use lifelog::{Document, GoalCategory};
    use lifelog_migrate::MigrationError;
    use serde_json::json;

    const LEGACY_MONTH: &str = r#"[{"id":"g1","month":"2024-01","todoGoal":"Clean","createdAt":"2024-01-01T00:00:00.000Z"}]"#;

    #[test]
    fn every_collection_uses_its_own_key() {
        let data = LocalData::open(MemoryStore::new());
        assert_eq!(data.todos.key(), "todos");
        assert_eq!(data.schedules.key(), "schedules");
        assert_eq!(data.sleep_records.key(), "sleepRecords");
        assert_eq!(data.weight_records.key(), "weightRecords");
        assert_eq!(data.meal_records.key(), "mealRecords");
        assert_eq!(data.diary_entries.key(), "diaryEntries");
        assert_eq!(data.daily_routines.key(), "dailyRoutines");
        assert_eq!(data.monthly_goals.key(), "monthlyGoals");
        assert_eq!(data.weekly_goals.key(), "weeklyGoals");
        assert_eq!(data.links.key(), "links");
        assert_eq!(data.settings.key(), "userSettings");
    }

    #[test]
    fn eager_migration_runs_at_build() {
        let store = MemoryStore::new();
        store.set("monthlyGoals", LEGACY_MONTH).unwrap();
        let data = LocalData::builder(store)
            .migration_config(MigrationConfig {
                write_back_on_read: false,
                eager_migration: true,
            })
            .build();

        let raw = data.store().get("monthlyGoals").unwrap().unwrap();
        assert!(raw.contains("\"todoGoals\":[\"Clean\"]"));
    }

    #[test]
    fn lazy_by_default() {
        let store = MemoryStore::new();
        store.set("monthlyGoals", LEGACY_MONTH).unwrap();
        let data = LocalData::open(store);
        assert_eq!(data.store().get("monthlyGoals").unwrap().as_deref(), Some(LEGACY_MONTH));

        let goals = data.monthly_goals.get_all();
        assert_eq!(goals[0].goals.goals(GoalCategory::Todo), ["Clean"]);
        assert!(!data.monthly_goals.needs_migration());
    }

    #[test]
    fn migration_config_reaches_both_goal_collections() {
        let store = MemoryStore::new();
        store.set("monthlyGoals", LEGACY_MONTH).unwrap();
        let weekly = r#"[{"id":"w","week":"2024-01-15","todoGoal":"Read","createdAt":"2024-01-15T00:00:00.000Z"}]"#;
        store.set("weeklyGoals", weekly).unwrap();
        let data = LocalData::builder(store)
            .migration_config(MigrationConfig {
                write_back_on_read: false,
                eager_migration: false,
            })
            .build();

        assert_eq!(data.monthly_goals.get_all()[0].goals.goals(GoalCategory::Todo), ["Clean"]);
        assert_eq!(data.weekly_goals.get_all()[0].goals.goals(GoalCategory::Todo), ["Read"]);
        assert_eq!(data.monthly_goals.raw().as_deref(), Some(LEGACY_MONTH));
        assert_eq!(data.weekly_goals.raw().as_deref(), Some(weekly));
    }

    struct Stamp;

    impl MigrationStep for Stamp {
        fn name(&self) -> &str {
            "stamp"
        }
        fn needs_migration(&self, doc: &Document) -> bool {
            !doc.contains_key("stamped")
        }
        fn migrate(&self, doc: &mut Document) -> Result<bool, MigrationError> {
            doc.insert("stamped".into(), json!(true));
            Ok(true)
        }
    }

    #[test]
    fn extra_steps_run_after_goal_steps() {
        let store = MemoryStore::new();
        store.set("weeklyGoals", r#"[{"id":"w","week":"2024-01-15","weightGoal":"x","createdAt":"2024-01-15T00:00:00.000Z"}]"#).unwrap();
        let data = LocalData::builder(store)
            .register_migration(Box::new(Stamp))
            .build();

        let (_, weekly) = data.migrate_all().unwrap();
        assert_eq!(weekly.migrated, 1);
        assert_eq!(weekly.per_step.last(), Some(&("stamp".to_string(), 1)));
        let raw = data.store().get("weeklyGoals").unwrap().unwrap();
        assert!(raw.contains("\"stamped\":true"));
        assert!(raw.contains("\"weightGoals\":[\"x\"]"));
    }

    #[test]
    fn slot_summaries_cover_every_key() {
        let data = LocalData::open(MemoryStore::new());
        data.todos.create(lifelog::TodoDraft::new("a")).unwrap();
        data.settings.modify(|s| s.dark_mode = true).unwrap();

        let summaries = data.slot_summaries();
        assert_eq!(summaries.len(), 11);
        let todos = &summaries[0];
        assert_eq!(todos.key, "todos");
        assert!(todos.present);
        assert_eq!(todos.records, Some(1));
        assert!(!summaries[1].present);
        assert_eq!(summaries[1].records, Some(0));
        let settings = summaries.last().unwrap();
        assert_eq!(settings.key, "userSettings");
        assert!(settings.present && settings.bytes > 0);
        assert_eq!(settings.records, None);
    }
}
