//! Work session: a block of generic activity time rather than a to-do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::WorkSessionId;
use super::task::DEFAULT_USER_ID;
use super::timestamp;

fn default_user_id() -> u64 {
    DEFAULT_USER_ID
}

fn default_color() -> String {
    "#ffffff".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSession {
    pub id: WorkSessionId,
    #[serde(default = "default_user_id")]
    pub user_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub is_extended: bool,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, with = "timestamp::optional")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input for work session creation. Duration is mandatory and checked
/// against the configured minimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSessionDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub is_extended: bool,
    #[serde(default, with = "timestamp::optional")]
    pub starts_at: Option<DateTime<Utc>>,
    /// Seconds
    pub duration: i64,
}

impl WorkSessionDraft {
    pub fn new(name: impl Into<String>, duration: i64) -> Self {
        Self {
            name: name.into(),
            color: default_color(),
            is_extended: false,
            starts_at: None,
            duration,
        }
    }

    pub fn starting_at(mut self, starts_at: DateTime<Utc>) -> Self {
        self.starts_at = Some(starts_at);
        self
    }

    pub fn into_work_session(self, id: WorkSessionId) -> WorkSession {
        WorkSession {
            id,
            user_id: DEFAULT_USER_ID,
            name: self.name,
            color: self.color,
            is_extended: self.is_extended,
            is_completed: false,
            completed_at: None,
        }
    }
}
