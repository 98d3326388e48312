//! Calendar widgets - headless components of the day grid
//!
//! Each widget is self-contained and communicates via EventBus

pub mod backlog;
pub mod calendar;
pub mod context;
pub mod day_column;
pub mod task_block;
pub mod time_rail;

pub use backlog::BacklogColumn;
pub use calendar::{CalendarView, DEFAULT_VIEWPORT_HEIGHT};
pub use context::{CalendarContext, DraggedItem, ScheduleRequest};
pub use day_column::{DayColumn, Placement};
pub use task_block::{Ghost, TaskBlock, TaskDrag};
pub use time_rail::{TIME_RAIL_KEY, TimeRail, TimeReadout};
