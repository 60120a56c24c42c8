use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::instant::{self, iso8601};
use crate::Record;

/// A saved bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a [`Link`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDraft {
    pub title: String,
    pub url: String,
    pub category: Option<String>,
    /// Defaults to now.
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Link {
    const COLLECTION: &'static str = "links";
    type Draft = LinkDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, d: LinkDraft) -> Self {
        Self {
            id,
            title: d.title,
            url: d.url,
            category: d.category,
            created_at: d.created_at.unwrap_or_else(instant::now),
        }
    }
}
