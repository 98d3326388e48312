//! Entities - schedulable items and the in-memory board
//!
//! JSON field names are camelCase to stay compatible with existing data files.

pub mod board;
pub mod item;
pub mod task;
pub mod time_block;
pub mod timestamp;
pub mod work_session;

pub use board::Board;
pub use item::{ItemKind, ItemRef, Schedule, TaskId, TimeBlockId, WorkSessionId};
pub use task::{Task, TaskDraft};
pub use time_block::{NewTimeBlock, TimeBlock};
pub use work_session::{WorkSession, WorkSessionDraft};
