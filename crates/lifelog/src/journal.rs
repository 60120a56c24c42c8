//! Day-keyed log records: schedules, sleep, weight, meals, diary, routines.
//!
//! `date` fields are calendar days (`YYYY-MM-DD`) kept as plain text; only
//! true instants are typed as `DateTime<Utc>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::instant::iso8601;
use crate::Record;

// ── Schedule ───────────────────────────────────────────────────────

/// An appointment on a given day, with an optional time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub text: String,
    pub date: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso8601::option"
    )]
    pub time: Option<DateTime<Utc>>,
    pub completed: bool,
}

/// Fields for creating a [`Schedule`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDraft {
    pub text: String,
    pub date: String,
    pub time: Option<DateTime<Utc>>,
    pub completed: bool,
}

impl Record for Schedule {
    const COLLECTION: &'static str = "schedules";
    type Draft = ScheduleDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, d: ScheduleDraft) -> Self {
        Self {
            id,
            text: d.text,
            date: d.date,
            time: d.time,
            completed: d.completed,
        }
    }
}

// ── Sleep ──────────────────────────────────────────────────────────

/// One night of sleep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepRecord {
    pub id: String,
    pub date: String,
    #[serde(with = "iso8601")]
    pub bedtime: DateTime<Utc>,
    #[serde(with = "iso8601")]
    pub wakeup: DateTime<Utc>,
    /// Minutes asleep.
    pub duration: f64,
}

/// Fields for creating a [`SleepRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct SleepDraft {
    pub date: String,
    pub bedtime: DateTime<Utc>,
    pub wakeup: DateTime<Utc>,
    pub duration: f64,
}

impl SleepDraft {
    /// Derive `duration` from the two instants. A wakeup before bedtime
    /// yields zero minutes.
    pub fn from_times(date: impl Into<String>, bedtime: DateTime<Utc>, wakeup: DateTime<Utc>) -> Self {
        let minutes = (wakeup - bedtime).num_minutes().max(0);
        Self {
            date: date.into(),
            bedtime,
            wakeup,
            duration: minutes as f64,
        }
    }
}

impl Record for SleepRecord {
    const COLLECTION: &'static str = "sleepRecords";
    type Draft = SleepDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, d: SleepDraft) -> Self {
        Self {
            id,
            date: d.date,
            bedtime: d.bedtime,
            wakeup: d.wakeup,
            duration: d.duration,
        }
    }
}

// ── Weight ─────────────────────────────────────────────────────────

/// A body weight measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightRecord {
    pub id: String,
    pub date: String,
    /// Kilograms.
    pub weight: f64,
    /// Centimeters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_fat: Option<f64>,
}

/// Fields for creating a [`WeightRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct WeightDraft {
    pub date: String,
    pub weight: f64,
    pub height: Option<f64>,
    pub body_fat: Option<f64>,
}

impl WeightRecord {
    /// Body mass index, when a positive height is recorded.
    pub fn bmi(&self) -> Option<f64> {
        let meters = self.height? / 100.0;
        (meters > 0.0).then(|| self.weight / (meters * meters))
    }
}

impl Record for WeightRecord {
    const COLLECTION: &'static str = "weightRecords";
    type Draft = WeightDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, d: WeightDraft) -> Self {
        Self {
            id,
            date: d.date,
            weight: d.weight,
            height: d.height,
            body_fat: d.body_fat,
        }
    }
}

// ── Meals ──────────────────────────────────────────────────────────

/// Which meal of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
}

/// A logged meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealRecord {
    pub id: String,
    pub date: String,
    pub meal: Meal,
    pub food: String,
    pub calories: f64,
}

/// Fields for creating a [`MealRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct MealDraft {
    pub date: String,
    pub meal: Meal,
    pub food: String,
    pub calories: f64,
}

impl Record for MealRecord {
    const COLLECTION: &'static str = "mealRecords";
    type Draft = MealDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, d: MealDraft) -> Self {
        Self {
            id,
            date: d.date,
            meal: d.meal,
            food: d.food,
            calories: d.calories,
        }
    }
}

// ── Diary ──────────────────────────────────────────────────────────

/// A diary entry with optional mood and photo references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    pub id: String,
    pub date: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<String>>,
}

/// Fields for creating a [`DiaryEntry`].
#[derive(Debug, Clone, PartialEq)]
pub struct DiaryDraft {
    pub date: String,
    pub content: String,
    pub mood: Option<String>,
    pub photos: Option<Vec<String>>,
}

impl Record for DiaryEntry {
    const COLLECTION: &'static str = "diaryEntries";
    type Draft = DiaryDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, d: DiaryDraft) -> Self {
        Self {
            id,
            date: d.date,
            content: d.content,
            mood: d.mood,
            photos: d.photos,
        }
    }
}

// ── Daily routine ──────────────────────────────────────────────────

/// Free-form notes on a day's routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRoutine {
    pub id: String,
    pub date: String,
    pub content: String,
}

/// Fields for creating a [`DailyRoutine`].
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineDraft {
    pub date: String,
    pub content: String,
}

impl Record for DailyRoutine {
    const COLLECTION: &'static str = "dailyRoutines";
    type Draft = RoutineDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, d: RoutineDraft) -> Self {
        Self {
            id,
            date: d.date,
            content: d.content,
        }
    }
}
