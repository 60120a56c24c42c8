//! Monthly and weekly goal sheets.
//!
//! A sheet tracks four categories of goals. Each category is stored as two
//! parallel lists: the goal texts and their completion flags. Entry `i` of
//! one list always corresponds to entry `i` of the other; every mutator
//! here keeps the two lists the same length.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::instant::{self, iso8601};
use crate::Record;

/// One of the four goal categories on a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalCategory {
    /// Body weight targets.
    Weight,
    /// Things that must get done.
    Todo,
    /// Things worth achieving.
    Achievement,
    /// Club, work or other activity targets.
    Activity,
}

impl GoalCategory {
    /// All categories in storage order.
    pub const ALL: [GoalCategory; 4] = [
        GoalCategory::Weight,
        GoalCategory::Todo,
        GoalCategory::Achievement,
        GoalCategory::Activity,
    ];

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Todo => "todo",
            Self::Achievement => "achievement",
            Self::Activity => "activity",
        }
    }

    /// Wire name of the goal list field.
    pub fn list_field(self) -> &'static str {
        match self {
            Self::Weight => "weightGoals",
            Self::Todo => "todoGoals",
            Self::Achievement => "achievementGoals",
            Self::Activity => "activityGoals",
        }
    }

    /// Wire name of the parallel completion-flag field.
    pub fn flags_field(self) -> &'static str {
        match self {
            Self::Weight => "weightGoalsCompleted",
            Self::Todo => "todoGoalsCompleted",
            Self::Achievement => "achievementGoalsCompleted",
            Self::Activity => "activityGoalsCompleted",
        }
    }

    /// Parse a short name as produced by [`GoalCategory::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// The goal lists shared by monthly and weekly goals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSheet {
    #[serde(default)]
    pub weight_goals: Vec<String>,
    #[serde(default)]
    pub todo_goals: Vec<String>,
    #[serde(default)]
    pub achievement_goals: Vec<String>,
    #[serde(default)]
    pub activity_goals: Vec<String>,
    #[serde(default)]
    pub weight_goals_completed: Vec<bool>,
    #[serde(default)]
    pub todo_goals_completed: Vec<bool>,
    #[serde(default)]
    pub achievement_goals_completed: Vec<bool>,
    #[serde(default)]
    pub activity_goals_completed: Vec<bool>,
}

impl GoalSheet {
    fn lists(&self, category: GoalCategory) -> (&Vec<String>, &Vec<bool>) {
        match category {
            GoalCategory::Weight => (&self.weight_goals, &self.weight_goals_completed),
            GoalCategory::Todo => (&self.todo_goals, &self.todo_goals_completed),
            GoalCategory::Achievement => {
                (&self.achievement_goals, &self.achievement_goals_completed)
            }
            GoalCategory::Activity => (&self.activity_goals, &self.activity_goals_completed),
        }
    }

    fn lists_mut(&mut self, category: GoalCategory) -> (&mut Vec<String>, &mut Vec<bool>) {
        match category {
            GoalCategory::Weight => (&mut self.weight_goals, &mut self.weight_goals_completed),
            GoalCategory::Todo => (&mut self.todo_goals, &mut self.todo_goals_completed),
            GoalCategory::Achievement => (
                &mut self.achievement_goals,
                &mut self.achievement_goals_completed,
            ),
            GoalCategory::Activity => {
                (&mut self.activity_goals, &mut self.activity_goals_completed)
            }
        }
    }

    /// Goal texts for a category.
    pub fn goals(&self, category: GoalCategory) -> &[String] {
        self.lists(category).0
    }

    /// Completion flags for a category, index-aligned with [`GoalSheet::goals`].
    pub fn completed(&self, category: GoalCategory) -> &[bool] {
        self.lists(category).1
    }

    /// Append an open goal.
    pub fn add_goal(&mut self, category: GoalCategory, text: impl Into<String>) {
        let (goals, flags) = self.lists_mut(category);
        goals.push(text.into());
        flags.push(false);
    }

    /// Set the completion flag of goal `index`. Returns `false` when out of range.
    pub fn set_completed(&mut self, category: GoalCategory, index: usize, done: bool) -> bool {
        match self.lists_mut(category).1.get_mut(index) {
            Some(flag) => {
                *flag = done;
                true
            }
            None => false,
        }
    }

    /// Remove goal `index` together with its flag. Returns `false` when out of range.
    pub fn remove_goal(&mut self, category: GoalCategory, index: usize) -> bool {
        let (goals, flags) = self.lists_mut(category);
        if index >= goals.len() {
            return false;
        }
        goals.remove(index);
        flags.remove(index);
        true
    }

    /// `(completed, total)` for a category.
    pub fn progress(&self, category: GoalCategory) -> (usize, usize) {
        let (goals, flags) = self.lists(category);
        (flags.iter().filter(|done| **done).count(), goals.len())
    }

    /// True when no category holds a goal.
    pub fn is_empty(&self) -> bool {
        GoalCategory::ALL.iter().all(|c| self.goals(*c).is_empty())
    }

    /// Pad missing flags with `false` and drop flags without a goal.
    pub fn align(&mut self) {
        for category in GoalCategory::ALL {
            let (goals, flags) = self.lists_mut(category);
            flags.resize(goals.len(), false);
        }
    }
}

/// Goals for one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyGoal {
    pub id: String,
    pub month: String,
    #[serde(flatten)]
    pub goals: GoalSheet,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a [`MonthlyGoal`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyGoalDraft {
    pub month: String,
    pub goals: GoalSheet,
    /// Defaults to now.
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for MonthlyGoal {
    const COLLECTION: &'static str = "monthlyGoals";
    type Draft = MonthlyGoalDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, d: MonthlyGoalDraft) -> Self {
        let mut goal = Self {
            id,
            month: d.month,
            goals: d.goals,
            created_at: d.created_at.unwrap_or_else(instant::now),
        };
        goal.normalize();
        goal
    }

    fn normalize(&mut self) {
        self.goals.align();
    }
}

/// Goals for one week, keyed by the week's first day (`YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyGoal {
    pub id: String,
    pub week: String,
    #[serde(flatten)]
    pub goals: GoalSheet,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a [`WeeklyGoal`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklyGoalDraft {
    pub week: String,
    pub goals: GoalSheet,
    /// Defaults to now.
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for WeeklyGoal {
    const COLLECTION: &'static str = "weeklyGoals";
    type Draft = WeeklyGoalDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, d: WeeklyGoalDraft) -> Self {
        let mut goal = Self {
            id,
            week: d.week,
            goals: d.goals,
            created_at: d.created_at.unwrap_or_else(instant::now),
        };
        goal.normalize();
        goal
    }

    fn normalize(&mut self) {
        self.goals.align();
    }
}
