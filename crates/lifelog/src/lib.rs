//! # lifelog
//!
//! Record model for a local-first personal productivity store: todos,
//! schedules, sleep/weight/meal logs, diary entries, daily routines, goals,
//! links and user settings.
//!
//! Every record is a flat field-map with a stable `id`. The JSON shape of
//! each type is the same one used on the REST wire: camelCase field names,
//! instants as ISO-8601 text.
//!
//! ## Quick Start
//!
//! ```
//! use lifelog::prelude::*;
//!
//! let todo = Todo::from_draft(lifelog::new_id(), TodoDraft::new("Buy milk"));
//! assert!(!todo.completed);
//!
//! let json = serde_json::to_value(&todo).unwrap();
//! assert_eq!(json["text"], "Buy milk");
//! ```
//!
//! ## Record types
//!
//! | Type | Collection key |
//! |------|----------------|
//! | [`Todo`] | `todos` |
//! | [`Schedule`] | `schedules` |
//! | [`SleepRecord`] | `sleepRecords` |
//! | [`WeightRecord`] | `weightRecords` |
//! | [`MealRecord`] | `mealRecords` |
//! | [`DiaryEntry`] | `diaryEntries` |
//! | [`DailyRoutine`] | `dailyRoutines` |
//! | [`MonthlyGoal`] | `monthlyGoals` |
//! | [`WeeklyGoal`] | `weeklyGoals` |
//! | [`Link`] | `links` |
//!
//! [`UserSettings`] is a singleton stored under [`SETTINGS_KEY`].

mod goal;
mod id;
mod journal;
mod link;
mod record;
mod settings;
mod todo;

pub mod instant;
pub mod prelude;

pub use goal::{GoalCategory, GoalSheet, MonthlyGoal, MonthlyGoalDraft, WeeklyGoal, WeeklyGoalDraft};
pub use id::new_id;
pub use journal::{
    DailyRoutine, DiaryDraft, DiaryEntry, Meal, MealDraft, MealRecord, RoutineDraft, Schedule,
    ScheduleDraft, SleepDraft, SleepRecord, WeightDraft, WeightRecord,
};
pub use link::{Link, LinkDraft};
pub use record::{Document, Record, ID_FIELD};
pub use settings::{UserSettings, SETTINGS_KEY};
pub use todo::{RepeatType, Todo, TodoDraft};

/// Every collection key, in a stable order.
pub const COLLECTION_KEYS: [&str; 10] = [
    Todo::COLLECTION,
    Schedule::COLLECTION,
    SleepRecord::COLLECTION,
    WeightRecord::COLLECTION,
    MealRecord::COLLECTION,
    DiaryEntry::COLLECTION,
    DailyRoutine::COLLECTION,
    MonthlyGoal::COLLECTION,
    WeeklyGoal::COLLECTION,
    Link::COLLECTION,
];
