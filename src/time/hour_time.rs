//! Wall-clock hour:minute value object.
//!
//! `HourTime` is the snapped result of a drop and the unit the time rail
//! renders. Construction validates ranges and never clamps.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Timelike};
use thiserror::Error;

const SECONDS_PER_DAY: i64 = 86_400;

/// Rejected `HourTime` construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HourTimeError {
    #[error("hour must be 0-23, got {0}")]
    Hour24(u32),
    #[error("hour must be 1-12, got {0}")]
    Hour12(u32),
    #[error("minute must be 0-59, got {0}")]
    Minute(u32),
    #[error("invalid meridiem {0:?}, expected AM or PM")]
    Meridiem(String),
    #[error("invalid time {0:?}, expected HH:MM or h:MM AM/PM")]
    Format(String),
}

/// AM/PM suffix of a 12-hour time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Meridiem::Am => "AM",
            Meridiem::Pm => "PM",
        }
    }
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Meridiem {
    type Err = HourTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AM" => Ok(Meridiem::Am),
            "PM" => Ok(Meridiem::Pm),
            _ => Err(HourTimeError::Meridiem(s.to_string())),
        }
    }
}

/// Hour and minute of a day, stored in 24-hour form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourTime {
    hour24: u8,
    minute: u8,
}

impl HourTime {
    /// Build from 24-hour form: hour 0-23, minute 0-59.
    pub fn new(hour24: u32, minute: u32) -> Result<Self, HourTimeError> {
        if hour24 > 23 {
            return Err(HourTimeError::Hour24(hour24));
        }
        if minute > 59 {
            return Err(HourTimeError::Minute(minute));
        }
        Ok(Self {
            hour24: hour24 as u8,
            minute: minute as u8,
        })
    }

    /// Build from 12-hour form: hour 1-12, minute 0-59.
    ///
    /// 12 AM is midnight (00:00) and 12 PM is noon (12:00).
    pub fn from_12_hour(hour12: u32, minute: u32, meridiem: Meridiem) -> Result<Self, HourTimeError> {
        if !(1..=12).contains(&hour12) {
            return Err(HourTimeError::Hour12(hour12));
        }
        let base = hour12 % 12;
        let hour24 = match meridiem {
            Meridiem::Am => base,
            Meridiem::Pm => base + 12,
        };
        Self::new(hour24, minute)
    }

    /// Wall-clock time of a unix instant in UTC.
    pub fn from_unix(unix_seconds: i64) -> Self {
        let of_day = unix_seconds.rem_euclid(SECONDS_PER_DAY);
        Self {
            hour24: (of_day / 3600) as u8,
            minute: ((of_day % 3600) / 60) as u8,
        }
    }

    /// Wall-clock time of an instant in its own timezone.
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self {
            hour24: dt.hour() as u8,
            minute: dt.minute() as u8,
        }
    }

    pub fn hour24(&self) -> u32 {
        self.hour24 as u32
    }

    pub fn minute(&self) -> u32 {
        self.minute as u32
    }

    pub fn meridiem(&self) -> Meridiem {
        if self.hour24 < 12 { Meridiem::Am } else { Meridiem::Pm }
    }

    /// "HH:MM", zero padded.
    pub fn time24(&self) -> String {
        format!("{:02}:{:02}", self.hour24, self.minute)
    }

    /// Hour on the 12-hour clock, "12" for midnight and noon.
    pub fn hour12(&self) -> String {
        match self.hour24 % 12 {
            0 => "12".to_string(),
            h => h.to_string(),
        }
    }

    pub fn hour12_with_suffix(&self) -> String {
        format!("{} {}", self.hour12(), self.meridiem())
    }

    pub fn time12(&self) -> String {
        format!("{}:{:02}", self.hour12(), self.minute)
    }

    pub fn time12_with_suffix(&self) -> String {
        format!("{} {}", self.time12(), self.meridiem())
    }

    /// Seconds elapsed since `reference_hour24` on the same clock.
    ///
    /// Wraps modulo 24 hours: 02:00 measured from 22 is four hours, not minus twenty.
    pub fn seconds_since(&self, reference_hour24: u32) -> i64 {
        let delta_hours = (self.hour24 as i64 - reference_hour24 as i64).rem_euclid(24);
        delta_hours * 3600 + self.minute as i64 * 60
    }

    /// Seconds since midnight.
    pub fn seconds_since_midnight(&self) -> i64 {
        self.seconds_since(0)
    }
}

impl fmt::Display for HourTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour24, self.minute)
    }
}

/// Parses "14:15", "2:15 PM" or "2:15PM".
impl FromStr for HourTime {
    type Err = HourTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        let (clock, meridiem) = if let Some(rest) = upper.strip_suffix("AM") {
            (rest.trim_end().to_string(), Some(Meridiem::Am))
        } else if let Some(rest) = upper.strip_suffix("PM") {
            (rest.trim_end().to_string(), Some(Meridiem::Pm))
        } else {
            (upper.clone(), None)
        };

        let (hour, minute) = clock
            .split_once(':')
            .ok_or_else(|| HourTimeError::Format(s.to_string()))?;
        let hour: u32 = hour.parse().map_err(|_| HourTimeError::Format(s.to_string()))?;
        let minute: u32 = minute.parse().map_err(|_| HourTimeError::Format(s.to_string()))?;

        match meridiem {
            Some(m) => Self::from_12_hour(hour, minute, m),
            None => Self::new(hour, minute),
        }
    }
}
