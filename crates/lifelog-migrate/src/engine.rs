use lifelog::Document;
use tracing::debug;

use crate::shape::{FieldGroup, GroupShape, GOAL_GROUPS};

/// A single rewrite that brings a record from a legacy shape to the current one.
///
/// Steps are detected by field presence rather than by version numbers, so
/// each step must be **idempotent**: once it has rewritten a record,
/// [`MigrationStep::needs_migration`] must return `false` for the result.
pub trait MigrationStep: Send + Sync {
    /// Name used in logs and reports.
    fn name(&self) -> &str;
    /// Whether `doc` still holds the legacy shape this step handles.
    fn needs_migration(&self, doc: &Document) -> bool;
    /// Rewrite `doc` in place. Returns `true` when it changed.
    fn migrate(&self, doc: &mut Document) -> Result<bool, MigrationError>;
}

/// Error during migration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// A step could not rewrite a record.
    #[error("migration step {step} failed: {reason}")]
    StepFailed { step: String, reason: String },
    /// A step reported success but the record still needs it.
    #[error("migration step {step} is not idempotent")]
    NotIdempotent { step: String },
}

/// Configuration for migrating reads.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Persist the migrated collection back to storage when any record
    /// changed during a read.
    pub write_back_on_read: bool,
    /// Migrate every migrating collection when the store is opened instead
    /// of on first read.
    pub eager_migration: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            write_back_on_read: true,
            eager_migration: false,
        }
    }
}

/// Rewrites one [`FieldGroup`] from its legacy scalar shape to lists.
#[derive(Debug, Clone)]
pub struct ScalarToList {
    group: FieldGroup,
    name: String,
}

impl ScalarToList {
    /// Step for a single field group.
    pub fn new(group: FieldGroup) -> Self {
        Self {
            name: format!("{}-scalar-to-list", group.name),
            group,
        }
    }

    /// The field group this step rewrites.
    pub fn group(&self) -> &FieldGroup {
        &self.group
    }
}

impl MigrationStep for ScalarToList {
    fn name(&self) -> &str {
        &self.name
    }

    fn needs_migration(&self, doc: &Document) -> bool {
        matches!(
            GroupShape::classify(doc, &self.group),
            GroupShape::Legacy { .. } | GroupShape::Mixed
        )
    }

    fn migrate(&self, doc: &mut Document) -> Result<bool, MigrationError> {
        Ok(GroupShape::classify(doc, &self.group).apply(doc, &self.group))
    }
}

/// Outcome of migrating a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Records looked at.
    pub examined: usize,
    /// Records changed by at least one step.
    pub migrated: usize,
    /// `(step name, records changed)` in registration order.
    pub per_step: Vec<(String, usize)>,
}

impl MigrationReport {
    /// True when any record changed, i.e. the collection must be persisted.
    pub fn changed(&self) -> bool {
        self.migrated > 0
    }
}

/// Runs an ordered set of [`MigrationStep`]s over records.
///
/// Every step is offered every record; a record is migrated when at least
/// one step changed it.
///
/// # Example
///
/// ```
/// use lifelog_migrate::MigrationEngine;
/// use serde_json::json;
///
/// let engine = MigrationEngine::goal_groups();
/// let mut docs = vec![json!({ "id": "g1", "weightGoal": "65kg" })
///     .as_object()
///     .unwrap()
///     .clone()];
///
/// let report = engine.migrate_collection(&mut docs).unwrap();
/// assert!(report.changed());
/// assert_eq!(docs[0]["weightGoals"], json!(["65kg"]));
/// assert!(!docs[0].contains_key("weightGoal"));
///
/// // A second pass finds nothing to do.
/// assert!(!engine.migrate_collection(&mut docs).unwrap().changed());
/// ```
#[derive(Default)]
pub struct MigrationEngine {
    steps: Vec<Box<dyn MigrationStep>>,
}

impl MigrationEngine {
    /// An engine with no steps: every record is already current.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// The engine used by monthly and weekly goals: one [`ScalarToList`]
    /// step per goal field group.
    pub fn goal_groups() -> Self {
        let mut engine = Self::new();
        for group in GOAL_GROUPS {
            engine.register(Box::new(ScalarToList::new(group)));
        }
        engine
    }

    /// Register a step. Steps run in registration order.
    pub fn register(&mut self, step: Box<dyn MigrationStep>) {
        self.steps.push(step);
    }

    /// Check if a record needs any step.
    pub fn needs_migration(&self, doc: &Document) -> bool {
        self.steps.iter().any(|s| s.needs_migration(doc))
    }

    /// Migrate one record. Returns the indices of the steps that changed it.
    pub fn migrate_document(&self, doc: &mut Document) -> Result<Vec<usize>, MigrationError> {
        let mut applied = Vec::new();
        for (i, step) in self.steps.iter().enumerate() {
            if !step.needs_migration(doc) {
                continue;
            }
            if step.migrate(doc)? {
                applied.push(i);
            }
            if step.needs_migration(doc) {
                return Err(MigrationError::NotIdempotent {
                    step: step.name().to_string(),
                });
            }
        }
        Ok(applied)
    }

    /// Migrate every record of a collection in place.
    pub fn migrate_collection(
        &self,
        docs: &mut [Document],
    ) -> Result<MigrationReport, MigrationError> {
        let mut report = MigrationReport {
            examined: docs.len(),
            migrated: 0,
            per_step: self
                .steps
                .iter()
                .map(|s| (s.name().to_string(), 0))
                .collect(),
        };

        for doc in docs.iter_mut() {
            let applied = self.migrate_document(doc)?;
            if applied.is_empty() {
                continue;
            }
            report.migrated += 1;
            for i in applied {
                report.per_step[i].1 += 1;
            }
        }

        if report.changed() {
            debug!(
                examined = report.examined,
                migrated = report.migrated,
                "migrated legacy records"
            );
        }
        Ok(report)
    }

    /// Names of the registered steps, in order.
    pub fn registered_steps(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}
