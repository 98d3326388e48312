//! Time-slot snapping and conflict engine.

pub mod conflict;
pub mod planner;
pub mod snap;

pub use conflict::{Interval, find_conflict};
pub use planner::{DropPlan, DropPlanner, DropRejection};
pub use snap::{SnappedTime, seconds_to_offset, snap};
