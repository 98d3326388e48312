//! Task: a concrete to-do item that can be scheduled or backlogged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::{TaskId, WorkSessionId};
use super::timestamp;

pub const DEFAULT_USER_ID: u64 = 1;

fn default_user_id() -> u64 {
    DEFAULT_USER_ID
}

fn default_order_index() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(default = "default_user_id")]
    pub user_id: u64,
    #[serde(default)]
    pub work_session_id: Option<WorkSessionId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tag1_id: Option<u64>,
    #[serde(default)]
    pub tag2_id: Option<u64>,
    #[serde(default = "default_order_index")]
    pub order_index: i64,
    #[serde(default)]
    pub is_important: bool,
    /// Has no scheduled time; listed in the backlog column
    #[serde(default)]
    pub is_backlogged: bool,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, with = "timestamp::optional")]
    pub soft_deadline: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now", with = "timestamp::required")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            user_id: DEFAULT_USER_ID,
            work_session_id: None,
            name: name.into(),
            description: None,
            tag1_id: None,
            tag2_id: None,
            order_index: 1,
            is_important: false,
            is_backlogged: true,
            is_completed: false,
            soft_deadline: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }
}

/// Input for task creation: everything but the id, plus an optional schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskDraft {
    pub name: String,
    pub description: Option<String>,
    pub work_session_id: Option<WorkSessionId>,
    pub is_important: bool,
    #[serde(with = "timestamp::optional")]
    pub soft_deadline: Option<DateTime<Utc>>,
    #[serde(with = "timestamp::optional")]
    pub starts_at: Option<DateTime<Utc>>,
    /// Seconds; zero with no start means "no time block"
    pub duration: i64,
}

impl TaskDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_duration(mut self, seconds: i64) -> Self {
        self.duration = seconds;
        self
    }

    pub fn starting_at(mut self, starts_at: DateTime<Utc>) -> Self {
        self.starts_at = Some(starts_at);
        self
    }

    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            description: self.description,
            work_session_id: self.work_session_id,
            is_important: self.is_important,
            soft_deadline: self.soft_deadline,
            is_backlogged: self.starts_at.is_none(),
            ..Task::new(id, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_json_takes_defaults() {
        let task: Task = serde_json::from_str(r#"{ "id": 4, "name": "Write report" }"#).unwrap();
        assert_eq!(task.user_id, 1);
        assert_eq!(task.order_index, 1);
        assert!(!task.is_backlogged);
        assert_eq!(task.description, None);
    }

    #[test]
    fn test_camel_case_and_postgres_timestamps() {
        let task: Task = serde_json::from_str(
            r#"{ "id": 1, "name": "a", "isBacklogged": true, "createdAt": "2026-01-22 21:30:00+1100" }"#,
        )
        .unwrap();
        assert!(task.is_backlogged);
        assert_eq!(task.created_at.to_rfc3339(), "2026-01-22T10:30:00+00:00");

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["isBacklogged"], true);
        assert_eq!(json["createdAt"], "2026-01-22T10:30:00+00:00");
    }

    #[test]
    fn test_draft_backlog_flag() {
        let task = TaskDraft::named("x").with_duration(1800).into_task(9);
        assert_eq!(task.id, 9);
        assert!(task.is_backlogged);
    }
}
