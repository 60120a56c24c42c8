use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::instant::{self, iso8601};
use crate::Record;

/// How a todo repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatType {
    /// One-off.
    #[default]
    None,
    /// Every day.
    Daily,
    /// On the weekdays listed in `repeatDays`.
    Weekly,
    /// On the day of month in `repeatDate`.
    Monthly,
}

/// A todo item, optionally repeating and optionally tied to a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Record id.
    pub id: String,
    /// What to do.
    pub text: String,
    /// Done flag.
    pub completed: bool,
    /// When the todo was created.
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
    /// Repeat rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_type: Option<RepeatType>,
    /// Weekdays (0 = Sunday) for weekly repeats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_days: Option<Vec<i64>>,
    /// Day of month for monthly repeats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_date: Option<i64>,
    /// Place name for location reminders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Latitude, kept as text like the wire format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_lat: Option<String>,
    /// Longitude, kept as text like the wire format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_lng: Option<String>,
    /// Reminder radius in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_radius: Option<f64>,
}

/// Fields for creating a [`Todo`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoDraft {
    pub text: String,
    pub completed: bool,
    /// Defaults to now.
    pub created_at: Option<DateTime<Utc>>,
    pub repeat_type: Option<RepeatType>,
    pub repeat_days: Option<Vec<i64>>,
    pub repeat_date: Option<i64>,
    pub location: Option<String>,
    pub location_lat: Option<String>,
    pub location_lng: Option<String>,
    pub location_radius: Option<f64>,
}

impl TodoDraft {
    /// An open, non-repeating todo.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Repeat weekly on the given weekdays.
    pub fn weekly(mut self, days: Vec<i64>) -> Self {
        self.repeat_type = Some(RepeatType::Weekly);
        self.repeat_days = Some(days);
        self
    }

    /// Repeat monthly on the given day of month.
    pub fn monthly(mut self, date: i64) -> Self {
        self.repeat_type = Some(RepeatType::Monthly);
        self.repeat_date = Some(date);
        self
    }

    /// Attach a location reminder.
    pub fn at(mut self, name: impl Into<String>, lat: &str, lng: &str, radius: f64) -> Self {
        self.location = Some(name.into());
        self.location_lat = Some(lat.to_string());
        self.location_lng = Some(lng.to_string());
        self.location_radius = Some(radius);
        self
    }
}

impl Todo {
    /// True when the todo recurs.
    pub fn is_repeating(&self) -> bool {
        !matches!(self.repeat_type, None | Some(RepeatType::None))
    }
}

impl Record for Todo {
    const COLLECTION: &'static str = "todos";
    type Draft = TodoDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: TodoDraft) -> Self {
        Self {
            id,
            text: draft.text,
            completed: draft.completed,
            created_at: draft.created_at.unwrap_or_else(instant::now),
            repeat_type: draft.repeat_type,
            repeat_days: draft.repeat_days,
            repeat_date: draft.repeat_date,
            location: draft.location,
            location_lat: draft.location_lat,
            location_lng: draft.location_lng,
            location_radius: draft.location_radius,
        }
    }
}
