//! Field groups and the legacy/current shape of a record.
//!
//! Before the schema change a goal record held one goal per category as a
//! lone string (`weightGoal`) plus a lone flag (`weightGoalCompleted`).
//! The current shape holds a list of goals (`weightGoals`) and a parallel
//! list of flags (`weightGoalsCompleted`). Each category is classified and
//! rewritten on its own.

use lifelog::{Document, GoalCategory};
use serde_json::Value;

/// Field names of one category, in both shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldGroup {
    /// Short name, e.g. `weight`.
    pub name: &'static str,
    /// Current goal list field.
    pub list: &'static str,
    /// Current completion-flag list field.
    pub flags: &'static str,
    /// Legacy scalar field.
    pub legacy: &'static str,
    /// Legacy scalar flag field.
    pub legacy_flag: &'static str,
}

/// The four goal field groups tracked on monthly and weekly goals.
pub const GOAL_GROUPS: [FieldGroup; 4] = [
    FieldGroup {
        name: "weight",
        list: "weightGoals",
        flags: "weightGoalsCompleted",
        legacy: "weightGoal",
        legacy_flag: "weightGoalCompleted",
    },
    FieldGroup {
        name: "todo",
        list: "todoGoals",
        flags: "todoGoalsCompleted",
        legacy: "todoGoal",
        legacy_flag: "todoGoalCompleted",
    },
    FieldGroup {
        name: "achievement",
        list: "achievementGoals",
        flags: "achievementGoalsCompleted",
        legacy: "achievementGoal",
        legacy_flag: "achievementGoalCompleted",
    },
    FieldGroup {
        name: "activity",
        list: "activityGoals",
        flags: "activityGoalsCompleted",
        legacy: "activityGoal",
        legacy_flag: "activityGoalCompleted",
    },
];

impl FieldGroup {
    /// The field group of a goal category.
    pub fn for_category(category: GoalCategory) -> FieldGroup {
        match category {
            GoalCategory::Weight => GOAL_GROUPS[0],
            GoalCategory::Todo => GOAL_GROUPS[1],
            GoalCategory::Achievement => GOAL_GROUPS[2],
            GoalCategory::Activity => GOAL_GROUPS[3],
        }
    }
}

/// Shape of one field group on one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupShape {
    /// Only the current fields are present.
    Current,
    /// The list field and legacy keys are both present. The lists win.
    Mixed,
    /// Only legacy keys are present.
    Legacy {
        /// The lone goal, if it held a value.
        value: Option<String>,
        /// The lone flag; `false` when absent or not a boolean.
        completed: bool,
    },
    /// Neither shape is present.
    Absent,
}

impl GroupShape {
    /// Classify a record by which fields of `group` it carries.
    pub fn classify(doc: &Document, group: &FieldGroup) -> GroupShape {
        let has_legacy = doc.contains_key(group.legacy) || doc.contains_key(group.legacy_flag);
        if doc.contains_key(group.list) {
            return if has_legacy {
                GroupShape::Mixed
            } else {
                GroupShape::Current
            };
        }
        if !has_legacy {
            return GroupShape::Absent;
        }
        GroupShape::Legacy {
            value: doc.get(group.legacy).and_then(scalar_text),
            completed: doc
                .get(group.legacy_flag)
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }

    /// Rewrite `doc` so that `group` is in current shape.
    ///
    /// Returns `true` when the record changed. `Legacy` builds the list
    /// fields from the legacy values; `Legacy` and `Mixed` both remove the
    /// legacy keys.
    pub fn apply(self, doc: &mut Document, group: &FieldGroup) -> bool {
        match self {
            GroupShape::Current | GroupShape::Absent => false,
            GroupShape::Mixed => {
                doc.shift_remove(group.legacy);
                doc.shift_remove(group.legacy_flag);
                true
            }
            GroupShape::Legacy { value, completed } => {
                let (goals, flags) = match value {
                    Some(text) => (vec![Value::String(text)], vec![Value::Bool(completed)]),
                    None => (Vec::new(), Vec::new()),
                };
                doc.shift_remove(group.legacy);
                doc.shift_remove(group.legacy_flag);
                doc.insert(group.list.to_string(), Value::Array(goals));
                doc.insert(group.flags.to_string(), Value::Array(flags));
                true
            }
        }
    }
}

// Null carries no goal; other non-string scalars keep their JSON text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
