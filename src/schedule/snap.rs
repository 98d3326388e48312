//! Pixel offset to wall-clock time, floor-snapped.
//!
//! `hour = floor(offset / hour_height)`, `minute = snap * floor(rem / slot)`
//! with `slot = hour_height / (60 / snap)`. Always rounds down to a snap
//! boundary, never to nearest.

use crate::time::{HourTime, HourTimeError};

/// Snapped hour/minute. `hour` is unbounded: offsets below the last hour row yield 24+.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnappedTime {
    pub hour: u32,
    pub minute: u32,
}

impl SnappedTime {
    /// Seconds since the start of the column's day.
    pub fn seconds(&self) -> i64 {
        self.hour as i64 * 3600 + self.minute as i64 * 60
    }

    pub fn to_hour_time(&self) -> Result<HourTime, HourTimeError> {
        HourTime::new(self.hour, self.minute)
    }
}

/// Snap a content-space pixel offset. Negative offsets clamp to zero.
///
/// Computed as a whole number of slots so the result is monotonic in
/// `offset` despite float rounding; equal to the hour/remainder form.
pub fn snap(offset: f32, hour_height: f32, snap_minutes: u32) -> SnappedTime {
    let snap_minutes = snap_minutes.clamp(1, 60);
    let slots_per_hour = (60 / snap_minutes).max(1) as u64;
    let slot_height = hour_height as f64 / slots_per_hour as f64;
    let offset = (offset as f64).max(0.0);

    let slots = if slot_height > 0.0 {
        (offset / slot_height).floor() as u64
    } else {
        0
    };

    SnappedTime {
        hour: (slots / slots_per_hour) as u32,
        minute: (slots % slots_per_hour) as u32 * snap_minutes,
    }
}

/// Pixel offset of `seconds` into a day.
pub fn seconds_to_offset(seconds: i64, hour_height: f32) -> f32 {
    (seconds as f64 / 3600.0 * hour_height as f64) as f32
}
