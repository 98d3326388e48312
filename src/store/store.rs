//! JsonStore: tasks, work sessions and time blocks as flat JSON files.
//!
//! Every mutation is a read-modify-write of whole files under one mutex, so
//! the REST server threads and the CLI can share a store handle.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::{debug, error, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::StoreError;
use super::file::{read_json, write_json};
use super::meta::{Counter, Counters};
use crate::entities::{
    Board, ItemRef, NewTimeBlock, Schedule, Task, TaskDraft, TaskId, TimeBlock, TimeBlockId,
    WorkSession, WorkSessionDraft, WorkSessionId,
};
use crate::service::ScheduleUpdate;

pub const TASKS_FILE: &str = "tasks.json";
pub const WORK_SESSIONS_FILE: &str = "work_sessions.json";
pub const TIME_BLOCKS_FILE: &str = "time_blocks.json";
pub const META_FILE: &str = "meta.json";

#[derive(Debug)]
pub struct JsonStore {
    dir: PathBuf,
    work_session_min_duration: i64,
    lock: Mutex<()>,
}

impl JsonStore {
    /// Store rooted at `dir`. Nothing is read or created until first use.
    pub fn new(dir: impl Into<PathBuf>, work_session_min_duration: i64) -> Self {
        Self {
            dir: dir.into(),
            work_session_min_duration,
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, StoreError> {
        read_json(&self.dir.join(name))
    }

    fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        write_json(&self.dir.join(name), value)
    }

    fn next_id(&self, counter: Counter) -> Result<u64, StoreError> {
        let mut counters: Counters = self.read(META_FILE)?;
        let id = counters.next_id(counter);
        self.write(META_FILE, &counters)?;
        Ok(id)
    }

    // === Reads ===

    pub fn tasks(&self) -> Result<Vec<Task>, StoreError> {
        let _g = self.guard();
        self.read(TASKS_FILE)
    }

    pub fn work_sessions(&self) -> Result<Vec<WorkSession>, StoreError> {
        let _g = self.guard();
        self.read(WORK_SESSIONS_FILE)
    }

    pub fn time_blocks(&self) -> Result<Vec<TimeBlock>, StoreError> {
        let _g = self.guard();
        self.read(TIME_BLOCKS_FILE)
    }

    /// Snapshot of everything, as the calendar view consumes it.
    pub fn load_board(&self) -> Result<Board, StoreError> {
        let _g = self.guard();
        let tasks: Vec<Task> = self.read(TASKS_FILE)?;
        let sessions: Vec<WorkSession> = self.read(WORK_SESSIONS_FILE)?;
        let blocks: Vec<TimeBlock> = self.read(TIME_BLOCKS_FILE)?;
        debug!(
            "Loaded board from {}: {} tasks, {} work sessions, {} time blocks",
            self.dir.display(),
            tasks.len(),
            sessions.len(),
            blocks.len()
        );
        Ok(Board::new(tasks, sessions, blocks))
    }

    // === Tasks ===

    /// Create a task, plus its time block unless the draft carries no schedule.
    pub fn create_task(&self, draft: TaskDraft) -> Result<(Task, Option<TimeBlock>), StoreError> {
        if draft.duration < 0 {
            return Err(StoreError::validation("task", "duration must not be negative"));
        }
        let _g = self.guard();
        if let Some(ws) = draft.work_session_id {
            let sessions: Vec<WorkSession> = self.read(WORK_SESSIONS_FILE)?;
            if !sessions.iter().any(|s| s.id == ws) {
                return Err(StoreError::NotFound { entity: "work session", id: ws });
            }
        }

        let (starts_at, duration) = (draft.starts_at, draft.duration);
        let task = draft.into_task(self.next_id(Counter::Task)?);
        let mut tasks: Vec<Task> = self.read(TASKS_FILE)?;
        tasks.push(task.clone());
        self.write(TASKS_FILE, &tasks)?;

        let block = self.attach_block(ItemRef::Task(task.id), starts_at, duration)?;
        info!("Created task {} ({:?})", task.id, task.name);
        Ok((task, block))
    }

    /// RFC 7386 merge patch. `id` is immutable.
    pub fn patch_task(&self, id: TaskId, patch: &Value) -> Result<Task, StoreError> {
        let _g = self.guard();
        let mut tasks: Vec<Task> = self.read(TASKS_FILE)?;
        let slot = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound { entity: "task", id })?;
        let mut patched: Task = apply_patch(&*slot, patch, "task")?;
        patched.id = id;
        *slot = patched.clone();
        self.write(TASKS_FILE, &tasks)?;
        Ok(patched)
    }

    /// Delete a task and its time block.
    pub fn delete_task(&self, id: TaskId) -> Result<(), StoreError> {
        let _g = self.guard();
        let mut tasks: Vec<Task> = self.read(TASKS_FILE)?;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(StoreError::NotFound { entity: "task", id });
        }
        self.write(TASKS_FILE, &tasks)?;
        self.detach_block(ItemRef::Task(id))?;
        info!("Deleted task {id}");
        Ok(())
    }

    // === Work sessions ===

    /// Create a work session and its time block. Duration must meet the minimum.
    pub fn create_work_session(
        &self,
        draft: WorkSessionDraft,
    ) -> Result<(WorkSession, Option<TimeBlock>), StoreError> {
        if draft.duration < self.work_session_min_duration {
            return Err(StoreError::validation(
                "work session",
                format!(
                    "duration {}s is below the minimum of {}s",
                    draft.duration, self.work_session_min_duration
                ),
            ));
        }
        let _g = self.guard();
        let (starts_at, duration) = (draft.starts_at, draft.duration);
        let session = draft.into_work_session(self.next_id(Counter::WorkSession)?);
        let mut sessions: Vec<WorkSession> = self.read(WORK_SESSIONS_FILE)?;
        sessions.push(session.clone());
        self.write(WORK_SESSIONS_FILE, &sessions)?;

        let block = self.attach_block(ItemRef::WorkSession(session.id), starts_at, duration)?;
        info!("Created work session {} ({:?})", session.id, session.name);
        Ok((session, block))
    }

    pub fn patch_work_session(&self, id: WorkSessionId, patch: &Value) -> Result<WorkSession, StoreError> {
        let _g = self.guard();
        let mut sessions: Vec<WorkSession> = self.read(WORK_SESSIONS_FILE)?;
        let slot = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::NotFound { entity: "work session", id })?;
        let mut patched: WorkSession = apply_patch(&*slot, patch, "work session")?;
        patched.id = id;
        *slot = patched.clone();
        self.write(WORK_SESSIONS_FILE, &sessions)?;
        Ok(patched)
    }

    /// Delete a work session and its time block. Tasks pointing at it are detached.
    pub fn delete_work_session(&self, id: WorkSessionId) -> Result<(), StoreError> {
        let _g = self.guard();
        let mut sessions: Vec<WorkSession> = self.read(WORK_SESSIONS_FILE)?;
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        if sessions.len() == before {
            return Err(StoreError::NotFound { entity: "work session", id });
        }
        self.write(WORK_SESSIONS_FILE, &sessions)?;

        let mut tasks: Vec<Task> = self.read(TASKS_FILE)?;
        let mut touched = false;
        for task in tasks.iter_mut().filter(|t| t.work_session_id == Some(id)) {
            task.work_session_id = None;
            touched = true;
        }
        if touched {
            self.write(TASKS_FILE, &tasks)?;
        }
        self.detach_block(ItemRef::WorkSession(id))?;
        info!("Deleted work session {id}");
        Ok(())
    }

    // === Time blocks ===

    pub fn create_time_block(&self, new: NewTimeBlock) -> Result<TimeBlock, StoreError> {
        let _g = self.guard();
        let candidate = new.into_time_block(0);
        let owner = self.validate_block(&candidate)?;
        if candidate.is_unscheduled() {
            return Err(StoreError::validation(
                "time block",
                "a block needs a start or a non-zero duration",
            ));
        }

        let mut blocks: Vec<TimeBlock> = self.read(TIME_BLOCKS_FILE)?;
        if blocks.iter().any(|b| b.is_owned_by(owner)) {
            return Err(StoreError::validation("time block", format!("{owner} already has a time block")));
        }
        let block = TimeBlock {
            id: self.next_id(Counter::TimeBlock)?,
            ..candidate
        };
        blocks.push(block.clone());
        self.write(TIME_BLOCKS_FILE, &blocks)?;
        Ok(block)
    }

    /// Patch a block. A patch that leaves it without start and duration
    /// deletes it and returns `None`.
    pub fn patch_time_block(&self, id: TimeBlockId, patch: &Value) -> Result<Option<TimeBlock>, StoreError> {
        let _g = self.guard();
        let mut blocks: Vec<TimeBlock> = self.read(TIME_BLOCKS_FILE)?;
        let index = blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or(StoreError::NotFound { entity: "time block", id })?;

        let mut patched: TimeBlock = apply_patch(&blocks[index], patch, "time block")?;
        patched.id = id;
        let owner = self.validate_block(&patched)?;
        if blocks.iter().any(|b| b.id != id && b.is_owned_by(owner)) {
            return Err(StoreError::validation("time block", format!("{owner} already has a time block")));
        }

        if patched.is_unscheduled() {
            blocks.remove(index);
            self.write(TIME_BLOCKS_FILE, &blocks)?;
            debug!("Time block {id} lost its schedule, deleted");
            return Ok(None);
        }
        blocks[index] = patched.clone();
        self.write(TIME_BLOCKS_FILE, &blocks)?;
        Ok(Some(patched))
    }

    pub fn delete_time_block(&self, id: TimeBlockId) -> Result<(), StoreError> {
        let _g = self.guard();
        let mut blocks: Vec<TimeBlock> = self.read(TIME_BLOCKS_FILE)?;
        let before = blocks.len();
        blocks.retain(|b| b.id != id);
        if blocks.len() == before {
            return Err(StoreError::NotFound { entity: "time block", id });
        }
        self.write(TIME_BLOCKS_FILE, &blocks)
    }

    // === Schedule ===

    /// Set or clear the schedule of `item`.
    ///
    /// Clearing keeps the duration so the item can be dropped back in at the
    /// same size; a block left with zero duration is deleted.
    pub fn update_schedule(&self, item: ItemRef, schedule: Option<Schedule>) -> Result<ScheduleUpdate, StoreError> {
        if schedule.is_some_and(|s| s.duration < 0) {
            return Err(StoreError::validation("time block", "duration must not be negative"));
        }
        let _g = self.guard();
        self.ensure_exists(item)?;

        let mut blocks: Vec<TimeBlock> = self.read(TIME_BLOCKS_FILE)?;
        let previous = blocks.clone();
        let existing = blocks.iter().position(|b| b.is_owned_by(item));
        let time_block = match (schedule, existing) {
            (Some(s), Some(i)) => {
                blocks[i].starts_at = Some(s.starts_at);
                blocks[i].duration = s.duration;
                Some(blocks[i].clone())
            }
            (Some(s), None) => {
                let block = TimeBlock::new(self.next_id(Counter::TimeBlock)?, item, Some(s.starts_at), s.duration);
                blocks.push(block.clone());
                Some(block)
            }
            (None, Some(i)) => {
                blocks[i].starts_at = None;
                if blocks[i].is_unscheduled() {
                    blocks.remove(i);
                    None
                } else {
                    Some(blocks[i].clone())
                }
            }
            (None, None) => None,
        };

        // Both files are computed before either is written
        let tasks = match item {
            ItemRef::Task(id) => {
                let mut tasks: Vec<Task> = self.read(TASKS_FILE)?;
                let task = tasks
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or(StoreError::NotFound { entity: "task", id })?;
                task.is_backlogged = schedule.is_none();
                let task = task.clone();
                Some((tasks, task))
            }
            ItemRef::WorkSession(_) => None,
        };

        self.write(TIME_BLOCKS_FILE, &blocks)?;
        let task = match tasks {
            Some((tasks, task)) => {
                if let Err(e) = self.write(TASKS_FILE, &tasks) {
                    warn!("Saving {item} failed, restoring {TIME_BLOCKS_FILE}");
                    if let Err(restore) = self.write(TIME_BLOCKS_FILE, &previous) {
                        error!("Failed to restore {TIME_BLOCKS_FILE}: {restore}");
                    }
                    return Err(e);
                }
                Some(task)
            }
            None => None,
        };

        match &schedule {
            Some(s) => info!("Scheduled {item} at {} for {}s", s.starts_at.to_rfc3339(), s.duration),
            None => info!("Moved {item} to the backlog"),
        }
        Ok(ScheduleUpdate { item, time_block, task })
    }

    // === Helpers (caller holds the lock) ===

    fn ensure_exists(&self, item: ItemRef) -> Result<(), StoreError> {
        let found = match item {
            ItemRef::Task(id) => self.read::<Vec<Task>>(TASKS_FILE)?.iter().any(|t| t.id == id),
            ItemRef::WorkSession(id) => self
                .read::<Vec<WorkSession>>(WORK_SESSIONS_FILE)?
                .iter()
                .any(|s| s.id == id),
        };
        if found {
            Ok(())
        } else {
            let entity = match item {
                ItemRef::Task(_) => "task",
                ItemRef::WorkSession(_) => "work session",
            };
            Err(StoreError::NotFound { entity, id: item.id() })
        }
    }

    /// Owner XOR, existing owner, non-negative duration.
    fn validate_block(&self, block: &TimeBlock) -> Result<ItemRef, StoreError> {
        let owner = block.owner().ok_or_else(|| {
            StoreError::validation("time block", "exactly one of taskId and workSessionId must be set")
        })?;
        if block.duration < 0 {
            return Err(StoreError::validation("time block", "duration must not be negative"));
        }
        self.ensure_exists(owner)?;
        Ok(owner)
    }

    fn attach_block(
        &self,
        owner: ItemRef,
        starts_at: Option<chrono::DateTime<chrono::Utc>>,
        duration: i64,
    ) -> Result<Option<TimeBlock>, StoreError> {
        let block = TimeBlock::new(0, owner, starts_at, duration);
        if block.is_unscheduled() {
            return Ok(None);
        }
        let block = TimeBlock {
            id: self.next_id(Counter::TimeBlock)?,
            ..block
        };
        let mut blocks: Vec<TimeBlock> = self.read(TIME_BLOCKS_FILE)?;
        blocks.push(block.clone());
        self.write(TIME_BLOCKS_FILE, &blocks)?;
        Ok(Some(block))
    }

    fn detach_block(&self, owner: ItemRef) -> Result<(), StoreError> {
        let mut blocks: Vec<TimeBlock> = self.read(TIME_BLOCKS_FILE)?;
        let before = blocks.len();
        blocks.retain(|b| !b.is_owned_by(owner));
        if blocks.len() != before {
            self.write(TIME_BLOCKS_FILE, &blocks)?;
        }
        Ok(())
    }
}

/// Apply an RFC 7386 merge patch to a serializable value.
fn apply_patch<T: Serialize + DeserializeOwned>(
    current: &T,
    patch: &Value,
    entity: &'static str,
) -> Result<T, StoreError> {
    if !patch.is_object() {
        return Err(StoreError::validation(entity, "patch must be a JSON object"));
    }
    let mut value =
        serde_json::to_value(current).map_err(|e| StoreError::validation(entity, e.to_string()))?;
    merge_patch(&mut value, patch);
    serde_json::from_value(value).map_err(|e| StoreError::validation(entity, e.to_string()))
}

fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Default::default());
    }
    if let Value::Object(map) = target {
        for (key, value) in patch {
            if value.is_null() {
                map.remove(key);
            } else {
                merge_patch(map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use tempfile::tempdir;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    fn store(dir: &Path) -> JsonStore {
        JsonStore::new(dir, 900)
    }

    #[test]
    fn test_create_task_with_and_without_block() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let (a, block) = store.create_task(TaskDraft::named("a")).unwrap();
        assert_eq!(a.id, 1);
        assert!(a.is_backlogged);
        assert!(block.is_none());

        let (b, block) = store
            .create_task(TaskDraft::named("b").with_duration(1800).starting_at(at(3600)))
            .unwrap();
        assert_eq!(b.id, 2);
        assert!(!b.is_backlogged);
        let block = block.unwrap();
        assert_eq!(block.id, 1);
        assert_eq!(block.task_id, Some(2));

        // Backlogged but sized
        let (_, block) = store.create_task(TaskDraft::named("c").with_duration(900)).unwrap();
        assert_eq!(block.unwrap().starts_at, None);

        assert_eq!(store.tasks().unwrap().len(), 3);
        assert_eq!(store.time_blocks().unwrap().len(), 2);
    }

    #[test]
    fn test_ids_survive_reopen() {
        let dir = tempdir().unwrap();
        store(dir.path()).create_task(TaskDraft::named("a")).unwrap();
        let (t, _) = store(dir.path()).create_task(TaskDraft::named("b")).unwrap();
        assert_eq!(t.id, 2);
    }

    #[test]
    fn test_work_session_minimum() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let err = store.create_work_session(WorkSessionDraft::new("short", 600)).unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));

        let (ws, block) = store.create_work_session(WorkSessionDraft::new("deep work", 3600)).unwrap();
        assert_eq!(block.unwrap().work_session_id, Some(ws.id));
    }

    #[test]
    fn test_time_block_owner_xor() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.create_task(TaskDraft::named("a")).unwrap();
        store.create_work_session(WorkSessionDraft::new("w", 900)).unwrap();

        let both = NewTimeBlock {
            task_id: Some(1),
            work_session_id: Some(1),
            starts_at: None,
            duration: 900,
        };
        assert!(matches!(store.create_time_block(both), Err(StoreError::Validation { .. })));

        let missing_owner = NewTimeBlock {
            task_id: Some(42),
            work_session_id: None,
            starts_at: None,
            duration: 900,
        };
        assert!(store.create_time_block(missing_owner).unwrap_err().is_not_found());

        let ok = NewTimeBlock {
            task_id: Some(1),
            work_session_id: None,
            starts_at: Some(at(0)),
            duration: 900,
        };
        store.create_time_block(ok.clone()).unwrap();
        // Second block for the same owner
        assert!(matches!(store.create_time_block(ok), Err(StoreError::Validation { .. })));
    }

    #[test]
    fn test_patch_to_degenerate_deletes_block() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let (_, block) = store.create_task(TaskDraft::named("a").with_duration(900)).unwrap();
        let id = block.unwrap().id;

        let patched = store.patch_time_block(id, &json!({ "duration": 1200 })).unwrap();
        assert_eq!(patched.unwrap().duration, 1200);

        assert_eq!(store.patch_time_block(id, &json!({ "duration": 0 })).unwrap(), None);
        assert!(store.time_blocks().unwrap().is_empty());
    }

    #[test]
    fn test_patch_task_keeps_id() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.create_task(TaskDraft::named("a")).unwrap();
        let task = store
            .patch_task(1, &json!({ "id": 99, "name": "renamed", "description": "x" }))
            .unwrap();
        assert_eq!(task.id, 1);
        assert_eq!(task.name, "renamed");

        let task = store.patch_task(1, &json!({ "description": null })).unwrap();
        assert_eq!(task.description, None);
        assert!(store.patch_task(5, &json!({})).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_task_cascades_block() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.create_task(TaskDraft::named("a").with_duration(900)).unwrap();
        store.delete_task(1).unwrap();
        assert!(store.time_blocks().unwrap().is_empty());
        assert!(store.delete_task(1).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_work_session_detaches_tasks() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.create_work_session(WorkSessionDraft::new("w", 900)).unwrap();
        let draft = TaskDraft {
            work_session_id: Some(1),
            ..TaskDraft::named("a")
        };
        store.create_task(draft).unwrap();
        store.delete_work_session(1).unwrap();
        assert_eq!(store.tasks().unwrap()[0].work_session_id, None);
        assert!(store.time_blocks().unwrap().is_empty());
    }

    #[test]
    fn test_update_schedule_set_and_clear() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.create_task(TaskDraft::named("a")).unwrap();

        let update = store
            .update_schedule(ItemRef::Task(1), Some(Schedule::new(at(7200), 1800)))
            .unwrap();
        let block = update.time_block.unwrap();
        assert_eq!(block.starts_at, Some(at(7200)));
        assert!(!update.task.unwrap().is_backlogged);

        // Clearing keeps the duration
        let update = store.update_schedule(ItemRef::Task(1), None).unwrap();
        let block = update.time_block.unwrap();
        assert_eq!(block.starts_at, None);
        assert_eq!(block.duration, 1800);
        assert!(update.task.unwrap().is_backlogged);

        let board = store.load_board().unwrap();
        assert_eq!(board.backlog().len(), 1);
    }

    #[test]
    fn test_update_schedule_missing_item() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let err = store
            .update_schedule(ItemRef::WorkSession(3), Some(Schedule::new(at(0), 900)))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_merge_patch_nested() {
        let mut target = json!({ "a": { "b": 1, "c": 2 }, "d": 3 });
        merge_patch(&mut target, &json!({ "a": { "b": null, "e": 4 }, "d": [1] }));
        assert_eq!(target, json!({ "a": { "c": 2, "e": 4 }, "d": [1] }));
    }

    #[test]
    fn test_update_schedule_failed_task_write_restores_blocks() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let (task, _) = store.create_task(TaskDraft::named("a").with_duration(900)).unwrap();
        let item = ItemRef::Task(task.id);
        let before = store.time_blocks().unwrap();

        // The atomic write of tasks.json goes through this path
        let blocker = dir.path().join("tasks.json.tmp");
        std::fs::create_dir(&blocker).unwrap();
        let err = store.update_schedule(item, Some(Schedule::new(at(3600), 900))).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        std::fs::remove_dir(&blocker).unwrap();

        assert_eq!(store.time_blocks().unwrap(), before);
        assert!(store.tasks().unwrap()[0].is_backlogged);
    }
}
