//! Schedule service: the single persistence call the calendar makes on drop.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{ItemRef, Schedule, Task, TimeBlock};
use crate::store::{JsonStore, StoreError};

/// Result of a schedule mutation, applied to the board on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUpdate {
    pub item: ItemRef,
    /// The item's block after the update; `None` when it has none left
    pub time_block: Option<TimeBlock>,
    /// Updated task row (backlog flag), for task items
    pub task: Option<Task>,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("schedule service unavailable: {0}")]
    Unavailable(String),
}

pub trait ScheduleService: Send + Sync {
    /// Set the item's schedule, or move it to the backlog with `None`.
    fn update_schedule(&self, item: ItemRef, schedule: Option<Schedule>) -> Result<ScheduleUpdate, ServiceError>;
}

impl ScheduleService for JsonStore {
    fn update_schedule(&self, item: ItemRef, schedule: Option<Schedule>) -> Result<ScheduleUpdate, ServiceError> {
        Ok(JsonStore::update_schedule(self, item, schedule)?)
    }
}
