//! Calendar date/time value objects.
//!
//! Every component does its time arithmetic through these types: day columns
//! resolve absolute instants from `CalendarDate`, the snapping engine
//! produces `HourTime`.

pub mod calendar_date;
pub mod hour_time;

pub use calendar_date::{
    CalendarDate, CalendarDateBuilder, CalendarDateError, date_range, month_block, parse_timestamp,
    resolve_timezone, shift_day, shift_month, week_of,
};
pub use hour_time::{HourTime, HourTimeError, Meridiem};
