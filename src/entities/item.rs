//! Identity of a schedulable item and the schedule it can carry.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;
use crate::schedule::Interval;

pub type TaskId = u64;
pub type WorkSessionId = u64;
pub type TimeBlockId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Task,
    WorkSession,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Task => "task",
            ItemKind::WorkSession => "work-session",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "task" | "tasks" => Ok(ItemKind::Task),
            "work-session" | "work_session" | "work-sessions" | "session" => Ok(ItemKind::WorkSession),
            other => Err(format!("unknown item kind {other:?}, expected task or work-session")),
        }
    }
}

/// A task or a work session, by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "kebab-case")]
pub enum ItemRef {
    Task(TaskId),
    WorkSession(WorkSessionId),
}

impl ItemRef {
    pub fn new(kind: ItemKind, id: u64) -> Self {
        match kind {
            ItemKind::Task => ItemRef::Task(id),
            ItemKind::WorkSession => ItemRef::WorkSession(id),
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            ItemRef::Task(_) => ItemKind::Task,
            ItemRef::WorkSession(_) => ItemKind::WorkSession,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            ItemRef::Task(id) | ItemRef::WorkSession(id) => *id,
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind(), self.id())
    }
}

/// A concrete start instant plus duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(with = "timestamp::required")]
    pub starts_at: DateTime<Utc>,
    /// Seconds
    pub duration: i64,
}

impl Schedule {
    pub fn new(starts_at: DateTime<Utc>, duration: i64) -> Self {
        Self { starts_at, duration }
    }

    pub fn interval(&self) -> Interval {
        Interval::from_duration(self.starts_at.timestamp(), self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_ref_display_and_kind() {
        assert_eq!(ItemRef::Task(3).to_string(), "task-3");
        assert_eq!(ItemRef::WorkSession(2).to_string(), "work-session-2");
        assert_eq!(ItemRef::new(ItemKind::WorkSession, 9).kind(), ItemKind::WorkSession);
        assert_eq!("work_session".parse::<ItemKind>(), Ok(ItemKind::WorkSession));
        assert!("meeting".parse::<ItemKind>().is_err());
    }

    #[test]
    fn test_item_ref_json_shape() {
        let json = serde_json::to_value(ItemRef::Task(7)).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "task", "id": 7 }));
    }
}
