//! Board: in-memory application state for the visible calendar.
//!
//! Holds every task, work session and time block the view knows about.
//! Conflict checks run against this state; it is updated only after the
//! schedule service confirms a mutation.

use indexmap::IndexMap;

use super::item::{ItemRef, TaskId, TimeBlockId, WorkSessionId};
use super::task::Task;
use super::time_block::TimeBlock;
use super::work_session::WorkSession;
use crate::schedule::Interval;
use crate::service::ScheduleUpdate;

#[derive(Debug, Clone, Default)]
pub struct Board {
    tasks: IndexMap<TaskId, Task>,
    work_sessions: IndexMap<WorkSessionId, WorkSession>,
    time_blocks: IndexMap<TimeBlockId, TimeBlock>,
}

impl Board {
    pub fn new(
        tasks: impl IntoIterator<Item = Task>,
        work_sessions: impl IntoIterator<Item = WorkSession>,
        time_blocks: impl IntoIterator<Item = TimeBlock>,
    ) -> Self {
        let mut board = Self::default();
        for task in tasks {
            board.upsert_task(task);
        }
        for session in work_sessions {
            board.upsert_work_session(session);
        }
        for block in time_blocks {
            board.upsert_time_block(block);
        }
        board
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn work_sessions(&self) -> impl Iterator<Item = &WorkSession> {
        self.work_sessions.values()
    }

    pub fn time_blocks(&self) -> impl Iterator<Item = &TimeBlock> {
        self.time_blocks.values()
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn work_session(&self, id: WorkSessionId) -> Option<&WorkSession> {
        self.work_sessions.get(&id)
    }

    pub fn contains(&self, item: ItemRef) -> bool {
        match item {
            ItemRef::Task(id) => self.tasks.contains_key(&id),
            ItemRef::WorkSession(id) => self.work_sessions.contains_key(&id),
        }
    }

    pub fn upsert_task(&mut self, task: Task) {
        self.tasks.insert(task.id, task);
    }

    pub fn upsert_work_session(&mut self, session: WorkSession) {
        self.work_sessions.insert(session.id, session);
    }

    /// Insert or replace a block. Degenerate blocks are dropped instead.
    pub fn upsert_time_block(&mut self, block: TimeBlock) {
        if block.is_unscheduled() {
            self.time_blocks.shift_remove(&block.id);
            return;
        }
        self.time_blocks.insert(block.id, block);
    }

    pub fn time_block_for(&self, item: ItemRef) -> Option<&TimeBlock> {
        self.time_blocks.values().find(|b| b.is_owned_by(item))
    }

    /// Duration of the item's block, zero when it has none.
    pub fn duration_of(&self, item: ItemRef) -> i64 {
        self.time_block_for(item).map(|b| b.duration).unwrap_or(0)
    }

    pub fn interval_of(&self, item: ItemRef) -> Option<Interval> {
        self.time_block_for(item).and_then(TimeBlock::interval)
    }

    /// Scheduled intervals intersecting `[start, end)`, in insertion order.
    pub fn scheduled_between(&self, start: i64, end: i64) -> Vec<(ItemRef, Interval)> {
        let range = Interval::new(start, end);
        self.time_blocks
            .values()
            .filter_map(|b| Some((b.owner()?, b.interval()?)))
            .filter(|(_, interval)| interval.overlaps(&range) || range.contains(interval.start))
            .collect()
    }

    /// Tasks without a scheduled start.
    pub fn backlog(&self) -> Vec<&Task> {
        self.tasks
            .values()
            .filter(|t| t.is_backlogged || self.interval_of(ItemRef::Task(t.id)).is_none())
            .collect()
    }

    /// Apply a confirmed schedule mutation.
    pub fn apply_update(&mut self, update: &ScheduleUpdate) {
        if let Some(task) = &update.task {
            self.upsert_task(task.clone());
        }
        self.time_blocks.retain(|_, b| !b.is_owned_by(update.item));
        if let Some(block) = &update.time_block {
            self.upsert_time_block(block.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn at(secs: i64) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(secs, 0)
    }

    fn board() -> Board {
        Board::new(
            vec![Task::new(1, "a"), Task::new(2, "b"), Task::new(3, "c")],
            vec![],
            vec![
                TimeBlock::new(10, ItemRef::Task(1), at(1000), 500),
                TimeBlock::new(11, ItemRef::Task(2), None, 900),
                TimeBlock::new(12, ItemRef::Task(3), None, 0),
            ],
        )
    }

    #[test]
    fn test_degenerate_blocks_are_dropped() {
        let board = board();
        assert_eq!(board.time_blocks().count(), 2);
        assert_eq!(board.duration_of(ItemRef::Task(3)), 0);
        assert_eq!(board.duration_of(ItemRef::Task(2)), 900);
    }

    #[test]
    fn test_scheduled_between_includes_spill_over() {
        let board = board();
        // Block 1000..1500 intersects a range starting at 1200
        assert_eq!(board.scheduled_between(1200, 2000).len(), 1);
        assert_eq!(board.scheduled_between(1500, 2000).len(), 0);
        assert_eq!(board.scheduled_between(0, 1000).len(), 0);
    }

    #[test]
    fn test_apply_update_replaces_block() {
        let mut board = board();
        let update = ScheduleUpdate {
            item: ItemRef::Task(2),
            time_block: Some(TimeBlock::new(11, ItemRef::Task(2), at(5000), 900)),
            task: None,
        };
        board.apply_update(&update);
        assert_eq!(board.interval_of(ItemRef::Task(2)), Some(Interval::new(5000, 5900)));

        let clear = ScheduleUpdate {
            item: ItemRef::Task(1),
            time_block: None,
            task: None,
        };
        board.apply_update(&clear);
        assert_eq!(board.interval_of(ItemRef::Task(1)), None);
    }
}
