//! Convenient re-exports of the record model.
//!
//! ```
//! use lifelog::prelude::*;
//! ```

pub use crate::goal::{GoalCategory, GoalSheet, MonthlyGoal, MonthlyGoalDraft, WeeklyGoal, WeeklyGoalDraft};
pub use crate::journal::{
    DailyRoutine, DiaryDraft, DiaryEntry, Meal, MealDraft, MealRecord, RoutineDraft, Schedule,
    ScheduleDraft, SleepDraft, SleepRecord, WeightDraft, WeightRecord,
};
pub use crate::link::{Link, LinkDraft};
pub use crate::settings::UserSettings;
pub use crate::todo::{RepeatType, Todo, TodoDraft};
pub use crate::{Document, Record};
