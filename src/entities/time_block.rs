//! Time block: the persisted schedule of exactly one task or work session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::{ItemRef, TaskId, TimeBlockId, WorkSessionId};
use super::timestamp;
use crate::schedule::Interval;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub id: TimeBlockId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_session_id: Option<WorkSessionId>,
    #[serde(default, with = "timestamp::optional")]
    pub starts_at: Option<DateTime<Utc>>,
    /// Seconds
    #[serde(default)]
    pub duration: i64,
}

impl TimeBlock {
    pub fn new(id: TimeBlockId, owner: ItemRef, starts_at: Option<DateTime<Utc>>, duration: i64) -> Self {
        let (task_id, work_session_id) = match owner {
            ItemRef::Task(id) => (Some(id), None),
            ItemRef::WorkSession(id) => (None, Some(id)),
        };
        Self {
            id,
            task_id,
            work_session_id,
            starts_at,
            duration,
        }
    }

    /// The owning item; `None` unless exactly one owner id is set.
    pub fn owner(&self) -> Option<ItemRef> {
        match (self.task_id, self.work_session_id) {
            (Some(id), None) => Some(ItemRef::Task(id)),
            (None, Some(id)) => Some(ItemRef::WorkSession(id)),
            _ => None,
        }
    }

    pub fn is_owned_by(&self, item: ItemRef) -> bool {
        self.owner() == Some(item)
    }

    /// Null start and zero duration: no schedule at all, must not be persisted.
    pub fn is_unscheduled(&self) -> bool {
        self.starts_at.is_none() && self.duration == 0
    }

    /// Occupied interval, when the block has a start.
    pub fn interval(&self) -> Option<Interval> {
        self.starts_at
            .map(|start| Interval::from_duration(start.timestamp(), self.duration))
    }
}

/// Time block creation input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTimeBlock {
    #[serde(default)]
    pub task_id: Option<TaskId>,
    #[serde(default)]
    pub work_session_id: Option<WorkSessionId>,
    #[serde(default, with = "timestamp::optional")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: i64,
}

impl NewTimeBlock {
    pub fn into_time_block(self, id: TimeBlockId) -> TimeBlock {
        TimeBlock {
            id,
            task_id: self.task_id,
            work_session_id: self.work_session_id,
            starts_at: self.starts_at,
            duration: self.duration,
        }
    }
}
