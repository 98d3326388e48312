//! Half-open interval overlap.

use serde::{Deserialize, Serialize};

use crate::entities::ItemRef;

/// `[start, end)` in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
}

impl Interval {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn from_duration(start: i64, duration: i64) -> Self {
        Self::new(start, start + duration)
    }

    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    pub fn contains(&self, instant: i64) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// First interval in `scheduled` overlapping `candidate`, skipping `exclude`'s own.
pub fn find_conflict(
    candidate: Interval,
    scheduled: &[(ItemRef, Interval)],
    exclude: ItemRef,
) -> Option<(ItemRef, Interval)> {
    scheduled
        .iter()
        .filter(|(item, _)| *item != exclude)
        .find(|(_, interval)| candidate.overlaps(interval))
        .copied()
}
