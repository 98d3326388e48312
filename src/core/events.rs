//! Calendar events carried on the event bus.

use super::geometry::HoveredColumnState;
use crate::entities::ItemRef;
use crate::schedule::Interval;

// === Drag broadcast (publish, not queued) ===

/// Pointer moved during a drag. Columns toggle their highlight, the time
/// rail renders a live readout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoverChanged(pub HoveredColumnState);

/// Final hover state of a gesture, published once after its last hover.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DropCommitted(pub HoveredColumnState);

// === Notices (emit, polled by the host) ===

/// User-facing outcome of a drop, for toasts.
#[derive(Clone, Debug, PartialEq)]
pub enum ScheduleNotice {
    /// Drop rejected: would overlap `other`
    Overlap {
        item: ItemRef,
        other: ItemRef,
        interval: Interval,
    },
    /// Item too short to place on the grid
    TooShort { item: ItemRef, minimum: i64 },
    /// Schedule service refused or failed; board left unchanged
    SaveFailed { item: ItemRef, message: String },
    Scheduled { item: ItemRef },
    Backlogged { item: ItemRef },
}
