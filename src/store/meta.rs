//! Per-kind id counters (`meta.json`).

use serde::{Deserialize, Serialize};

fn first_id() -> u64 {
    1
}

/// Next id to hand out for each entity kind. Ids start at 1 and never repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    #[serde(default = "first_id")]
    pub task: u64,
    #[serde(default = "first_id")]
    pub work_session: u64,
    #[serde(default = "first_id")]
    pub time_block: u64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            task: 1,
            work_session: 1,
            time_block: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Task,
    WorkSession,
    TimeBlock,
}

impl Counters {
    pub fn next_id(&mut self, counter: Counter) -> u64 {
        let slot = match counter {
            Counter::Task => &mut self.task,
            Counter::WorkSession => &mut self.work_session,
            Counter::TimeBlock => &mut self.time_block,
        };
        let id = *slot;
        *slot += 1;
        id
    }
}
