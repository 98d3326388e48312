//! Drop planning: minimum-duration gate, snapping, absolute time, conflict check.
//!
//! Checks run in that order. A rejection is an expected outcome of normal
//! use, returned as `DropRejection` and logged by the caller, never raised.

use thiserror::Error;

use super::conflict::{Interval, find_conflict};
use super::snap::{SnappedTime, snap};
use crate::config::CalendarConfig;
use crate::entities::{ItemKind, ItemRef, Schedule};
use crate::time::{CalendarDate, HourTime};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropRejection {
    #[error("released outside every drop target")]
    NoColumn,
    #[error("{item} is {duration}s long, needs at least {minimum}s")]
    BelowMinimumDuration { item: ItemRef, duration: i64, minimum: i64 },
    #[error("{hour:02}:{minute:02} is past the end of the day")]
    OutOfRange { hour: u32, minute: u32 },
    #[error("{item} would overlap {other} ({}..{})", interval.start, interval.end)]
    Conflict { item: ItemRef, other: ItemRef, interval: Interval },
}

/// Accepted drop: where the item goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropPlan {
    pub item: ItemRef,
    pub time: HourTime,
    pub schedule: Schedule,
}

#[derive(Debug, Clone, Copy)]
pub struct DropPlanner<'a> {
    config: &'a CalendarConfig,
}

impl<'a> DropPlanner<'a> {
    pub fn new(config: &'a CalendarConfig) -> Self {
        Self { config }
    }

    pub fn min_duration(&self, kind: ItemKind) -> i64 {
        match kind {
            ItemKind::Task => self.config.task_min_duration_secs,
            ItemKind::WorkSession => self.config.work_session_min_duration_secs,
        }
    }

    /// Duration must be non-zero and at least the kind's minimum.
    pub fn check_duration(&self, item: ItemRef, duration: i64) -> Result<(), DropRejection> {
        let minimum = self.min_duration(item.kind());
        if duration <= 0 || duration < minimum {
            return Err(DropRejection::BelowMinimumDuration { item, duration, minimum });
        }
        Ok(())
    }

    pub fn snap(&self, content_top: f32) -> SnappedTime {
        snap(content_top, self.config.hour_height, self.config.snap_minutes)
    }

    /// Snapped wall-clock time and its absolute instant in `day`.
    pub fn resolve(&self, day: &CalendarDate, content_top: f32) -> Result<(HourTime, i64), DropRejection> {
        let snapped = self.snap(content_top);
        let time = snapped.to_hour_time().map_err(|_| DropRejection::OutOfRange {
            hour: snapped.hour,
            minute: snapped.minute,
        })?;
        let start = day.builder().add_seconds(time.seconds_since_midnight()).unix_seconds();
        Ok((time, start))
    }

    /// Full pipeline for a drop at `content_top` in `day`.
    ///
    /// `scheduled` holds every interval of that day; the item's own is skipped.
    pub fn plan(
        &self,
        item: ItemRef,
        duration: i64,
        day: &CalendarDate,
        content_top: f32,
        scheduled: &[(ItemRef, Interval)],
    ) -> Result<DropPlan, DropRejection> {
        self.check_duration(item, duration)?;
        let (time, start) = self.resolve(day, content_top)?;
        self.place(item, time, start, duration, scheduled)
    }

    /// Plan for an explicit wall-clock time instead of a pixel offset.
    pub fn plan_at(
        &self,
        item: ItemRef,
        duration: i64,
        day: &CalendarDate,
        time: HourTime,
        scheduled: &[(ItemRef, Interval)],
    ) -> Result<DropPlan, DropRejection> {
        self.check_duration(item, duration)?;
        let start = day.builder().add_seconds(time.seconds_since_midnight()).unix_seconds();
        self.place(item, time, start, duration, scheduled)
    }

    fn place(
        &self,
        item: ItemRef,
        time: HourTime,
        start: i64,
        duration: i64,
        scheduled: &[(ItemRef, Interval)],
    ) -> Result<DropPlan, DropRejection> {
        let candidate = Interval::from_duration(start, duration);
        if let Some((other, interval)) = find_conflict(candidate, scheduled, item) {
            return Err(DropRejection::Conflict { item, other, interval });
        }

        let starts_at = crate::time::CalendarDateBuilder::new(start).to_datetime();
        Ok(DropPlan {
            item,
            time,
            schedule: Schedule::new(starts_at, duration),
        })
    }
}
