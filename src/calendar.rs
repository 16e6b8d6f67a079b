use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Utc};

use crate::config::get_timezone;

/// Display format for dates shown to the operator, e.g. "1. 1. 2024".
pub const DISPLAY_FORMAT: &str = "%-d. %-m. %Y";

/// Canonical storage format for date keys.
pub const KEY_FORMAT: &str = "%Y-%m-%d";

/// Parse a date typed by the operator.
///
/// Accepts the display format with or without spaces after the dots
/// ("1. 1. 2024", "1.1.2024") and ISO dates ("2024-01-01", as sent by
/// native date pickers). Returns `None` for anything else.
pub fn parse_display_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if input.contains('-') {
        return NaiveDate::parse_from_str(input, KEY_FORMAT).ok();
    }

    let parts: Vec<&str> = input.split('.').map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }

    let day: u32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let year: i32 = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// Weekday index with 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Drop the time-of-day component.
pub fn normalize(datetime: NaiveDateTime) -> NaiveDate {
    datetime.date()
}

/// Earliest date on or after `date` whose weekday index equals `index`.
pub fn first_on_or_after(date: NaiveDate, index: u32) -> Option<NaiveDate> {
    let offset = (7 + index as i64 - weekday_index(date) as i64) % 7;
    add_days(date, offset)
}

/// Today in the configured timezone.
pub fn today() -> NaiveDate {
    normalize(Utc::now().with_timezone(&get_timezone()).naive_local())
}

/// Structured key identifying one calendar date, independent of how the date
/// is displayed. Renders as an ISO date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(pub NaiveDate);

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        DateKey(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, KEY_FORMAT).map(DateKey)
    }
}
