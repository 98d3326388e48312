//! Calendar day in a fixed timezone.
//!
//! A day column is identified by its `NaiveDate`; all instants are resolved
//! against the configured IANA zone. Day boundaries follow the zone's local
//! midnight, so DST transition days are 23 or 25 hours long.

use chrono::{
    DateTime, Datelike, Days, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    SecondsFormat, TimeDelta, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarDateError {
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),
}

/// Parse an IANA zone name, falling back to UTC.
pub fn resolve_timezone(name: &str) -> Tz {
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            log::warn!("Unknown timezone {:?}, falling back to UTC", name);
            Tz::UTC
        }
    }
}

/// One calendar day in a timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDate {
    date: NaiveDate,
    timezone: Tz,
    start_seconds: i64,
    end_seconds: i64,
    tz_offset_seconds: i32,
}

impl CalendarDate {
    /// Day containing `date` in zone `timezone` (UTC when the name is unknown).
    pub fn from_date(date: NaiveDate, timezone: &str) -> Self {
        Self::in_zone(date, resolve_timezone(timezone))
    }

    /// Day containing the instant `timestamp`, as seen from `timezone`.
    ///
    /// Accepts RFC 3339 and Postgres `timestamptz` renderings such as
    /// `2026-02-11 15:30:00+00` or `2026-02-11 15:30:00+1100`.
    pub fn from_timestamp(timestamp: &str, timezone: &str) -> Result<Self, CalendarDateError> {
        let instant = parse_timestamp(timestamp)?;
        let tz = resolve_timezone(timezone);
        let local = instant.with_timezone(&tz);
        Ok(Self::in_zone(local.date_naive(), tz))
    }

    pub fn in_zone(date: NaiveDate, timezone: Tz) -> Self {
        let start = local_midnight(date, timezone);
        let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
        let end = local_midnight(next, timezone);

        Self {
            date,
            timezone,
            start_seconds: start.timestamp(),
            end_seconds: end.timestamp(),
            tz_offset_seconds: start.offset().fix().local_minus_utc(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    /// Unix seconds of local midnight.
    pub fn start_seconds(&self) -> i64 {
        self.start_seconds
    }

    /// Unix seconds of the next local midnight (exclusive end).
    pub fn end_seconds(&self) -> i64 {
        self.end_seconds
    }

    /// UTC offset of the zone at the start of the day.
    pub fn tz_offset_seconds(&self) -> i32 {
        self.tz_offset_seconds
    }

    pub fn start_local_seconds(&self) -> i64 {
        self.start_seconds + self.tz_offset_seconds as i64
    }

    pub fn end_local_seconds(&self) -> i64 {
        self.end_seconds + self.tz_offset_seconds as i64
    }

    pub fn start(&self) -> DateTime<Utc> {
        CalendarDateBuilder::new(self.start_seconds).to_datetime()
    }

    pub fn end(&self) -> DateTime<Utc> {
        CalendarDateBuilder::new(self.end_seconds).to_datetime()
    }

    pub fn length_seconds(&self) -> i64 {
        self.end_seconds - self.start_seconds
    }

    /// True when `unix_seconds` falls inside `[start, end)`.
    pub fn contains(&self, unix_seconds: i64) -> bool {
        unix_seconds >= self.start_seconds && unix_seconds < self.end_seconds
    }

    /// Column key, `YYYY-MM-DD`.
    pub fn key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Independent instant arithmetic starting at local midnight.
    pub fn builder(&self) -> CalendarDateBuilder {
        CalendarDateBuilder::new(self.start_seconds)
    }
}

/// Chained second/minute/hour arithmetic over a unix instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDateBuilder {
    unix_seconds: i64,
}

impl CalendarDateBuilder {
    pub fn new(unix_seconds: i64) -> Self {
        Self { unix_seconds }
    }

    pub fn add_seconds(self, seconds: i64) -> Self {
        Self::new(self.unix_seconds + seconds)
    }

    pub fn add_minutes(self, minutes: i64) -> Self {
        self.add_seconds(minutes * 60)
    }

    pub fn add_hours(self, hours: i64) -> Self {
        self.add_seconds(hours * 3600)
    }

    pub fn unix_seconds(&self) -> i64 {
        self.unix_seconds
    }

    /// `2026-01-01T14:15:00.000Z`
    pub fn to_iso_string(&self) -> String {
        self.to_datetime().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.unix_seconds, 0).unwrap_or_default()
    }
}

/// `count` consecutive days starting at `anchor`.
pub fn date_range(anchor: NaiveDate, count: usize) -> Vec<NaiveDate> {
    anchor.iter_days().take(count).collect()
}

/// Monday-first week containing `date`.
pub fn week_of(date: NaiveDate) -> Vec<NaiveDate> {
    date_range(date.week(Weekday::Mon).first_day(), 7)
}

/// Mini-calendar grid for `month` (1-based) of `year`: six Monday-first
/// weeks starting on or before the 1st. `None` for an invalid month.
pub fn month_block(year: i32, month: u32) -> Option<[NaiveDate; 42]> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let start = first.week(Weekday::Mon).first_day();
    date_range(start, 42).try_into().ok()
}

/// `(year, month)` moved by `delta` months, wrapping across years.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// `date` moved by `delta` days, rolling over month and year ends.
pub fn shift_day(date: NaiveDate, delta: i64) -> Option<NaiveDate> {
    TimeDelta::try_days(delta).and_then(|d| date.checked_add_signed(d))
}

/// Parse RFC 3339 or a Postgres timestamptz rendering.
pub fn parse_timestamp(timestamp: &str) -> Result<DateTime<FixedOffset>, CalendarDateError> {
    let trimmed = timestamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt);
    }
    DateTime::parse_from_rfc3339(&normalize_timestamptz(trimmed))
        .map_err(|_| CalendarDateError::InvalidTimestamp(timestamp.to_string()))
}

// "2026-02-11 15:30:00+11" -> "2026-02-11T15:30:00+11:00"
fn normalize_timestamptz(ts: &str) -> String {
    let s = ts.replacen(' ', "T", 1);
    let Some(t_pos) = s.find('T') else {
        return s;
    };
    let Some(sign_rel) = s[t_pos..].rfind(|c: char| c == '+' || c == '-') else {
        return s;
    };
    let sign_pos = t_pos + sign_rel;
    let (head, offset) = s.split_at(sign_pos);
    let digits = &offset[1..];
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return s;
    }
    match digits.len() {
        2 => format!("{head}{}{digits}:00", &offset[..1]),
        4 => format!("{head}{}{}:{}", &offset[..1], &digits[..2], &digits[2..]),
        _ => s.clone(),
    }
}

// Local midnight can sit inside a DST gap; walk forward to the first valid time.
fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    let midnight = NaiveDateTime::new(date, NaiveTime::MIN);
    let mut probe = midnight;
    for _ in 0..(24 * 4) {
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => probe += TimeDelta::minutes(15),
        }
    }
    tz.from_utc_datetime(&midnight)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_utc_day_bounds() {
        let day = CalendarDate::from_date(ymd(2026, 1, 1), "UTC");
        assert_eq!(day.start_seconds(), 1_767_225_600);
        assert_eq!(day.end_seconds(), 1_767_225_600 + 86_400);
        assert_eq!(day.tz_offset_seconds(), 0);
        assert_eq!(day.key(), "2026-01-01");
    }

    #[test]
    fn test_invalid_timezone_falls_back_to_utc() {
        let day = CalendarDate::from_date(ymd(2026, 1, 1), "Mars/Olympus_Mons");
        assert_eq!(day.timezone(), Tz::UTC);
        assert_eq!(day.start_seconds(), 1_767_225_600);
    }

    #[test]
    fn test_zone_offset_and_local_start() {
        // Sydney is UTC+11 in January
        let day = CalendarDate::from_date(ymd(2026, 1, 1), "Australia/Sydney");
        assert_eq!(day.tz_offset_seconds(), 11 * 3600);
        assert_eq!(day.start_seconds(), 1_767_225_600 - 11 * 3600);
        assert_eq!(day.start_local_seconds(), 1_767_225_600);
    }

    #[test]
    fn test_dst_day_lengths() {
        // US spring forward / fall back
        let spring = CalendarDate::from_date(ymd(2026, 3, 8), "America/New_York");
        assert_eq!(spring.length_seconds(), 23 * 3600);
        let fall = CalendarDate::from_date(ymd(2026, 11, 1), "America/New_York");
        assert_eq!(fall.length_seconds(), 25 * 3600);
    }

    #[test]
    fn test_from_timestamp_forms() {
        let a = CalendarDate::from_timestamp("2026-02-11 15:30:00+00", "UTC").unwrap();
        let b = CalendarDate::from_timestamp("2026-02-11T15:30:00Z", "UTC").unwrap();
        let c = CalendarDate::from_timestamp("2026-02-12 02:30:00+1100", "UTC").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.date(), ymd(2026, 2, 11));

        // Same instant is already the next day in Sydney
        let syd = CalendarDate::from_timestamp("2026-02-11 15:30:00+00", "Australia/Sydney").unwrap();
        assert_eq!(syd.date(), ymd(2026, 2, 12));

        assert!(CalendarDate::from_timestamp("yesterday", "UTC").is_err());
    }

    #[test]
    fn test_builder_chain() {
        let day = CalendarDate::from_date(ymd(2026, 1, 1), "UTC");
        let b = day.builder().add_hours(14).add_minutes(15).add_seconds(30);
        assert_eq!(b.unix_seconds(), 1_767_225_600 + 14 * 3600 + 15 * 60 + 30);
        assert_eq!(b.to_iso_string(), "2026-01-01T14:15:30.000Z");
        assert_eq!(b.to_datetime().timestamp(), b.unix_seconds());
    }

    #[test]
    fn test_week_of_starts_monday() {
        // 2026-10-21 is a Wednesday
        let week = week_of(ymd(2026, 10, 21));
        assert_eq!(week.len(), 7);
        assert_eq!(week[0], ymd(2026, 10, 19));
        assert_eq!(week[0].weekday(), Weekday::Mon);
        assert_eq!(week[6], ymd(2026, 10, 25));
        // A Monday is its own week start
        assert_eq!(week_of(ymd(2026, 10, 19))[0], ymd(2026, 10, 19));
    }

    #[test]
    fn test_month_block() {
        // March 2024 starts on a Friday
        let grid = month_block(2024, 3).unwrap();
        assert_eq!(grid[0], ymd(2024, 2, 26));
        assert_eq!(grid[4], ymd(2024, 3, 1));
        assert_eq!(grid[41], ymd(2024, 4, 7));
        assert!(grid.iter().step_by(7).all(|d| d.weekday() == Weekday::Mon));

        // Month starting on a Monday is not padded
        assert_eq!(month_block(2024, 1).unwrap()[0], ymd(2024, 1, 1));
        // Grid reaching back into the previous year
        assert_eq!(month_block(2026, 1).unwrap()[0], ymd(2025, 12, 29));
        assert!(month_block(2026, 13).is_none());
        assert!(month_block(2026, 0).is_none());
    }

    #[test]
    fn test_shift_month_across_years() {
        assert_eq!(shift_month(2026, 1, -1), (2025, 12));
        assert_eq!(shift_month(2025, 12, 1), (2026, 1));
        assert_eq!(shift_month(2026, 5, 0), (2026, 5));
        assert_eq!(shift_month(2026, 3, -15), (2024, 12));
        assert_eq!(shift_month(2026, 11, 14), (2028, 1));
    }

    #[test]
    fn test_shift_day_across_boundaries() {
        assert_eq!(shift_day(ymd(2026, 1, 1), -1), Some(ymd(2025, 12, 31)));
        assert_eq!(shift_day(ymd(2025, 12, 31), 1), Some(ymd(2026, 1, 1)));
        assert_eq!(shift_day(ymd(2024, 2, 28), 1), Some(ymd(2024, 2, 29)));
        assert_eq!(shift_day(ymd(2024, 3, 1), -1), Some(ymd(2024, 2, 29)));
        assert_eq!(shift_day(ymd(2026, 5, 4), 0), Some(ymd(2026, 5, 4)));
    }
}
