use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::calendar::{self, DateKey};

/// Day of the week. Ordered Monday first, which is also the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Stable short code used in form field names and URLs.
    pub fn code(self) -> &'static str {
        match self {
            Weekday::Monday => "mon",
            Weekday::Tuesday => "tue",
            Weekday::Wednesday => "wed",
            Weekday::Thursday => "thu",
            Weekday::Friday => "fri",
            Weekday::Saturday => "sat",
            Weekday::Sunday => "sun",
        }
    }

    pub fn from_code(code: &str) -> Option<Weekday> {
        Weekday::ALL.into_iter().find(|d| d.code() == code)
    }

    /// Index compatible with `calendar::weekday_index` (0 = Sunday).
    pub fn index(self) -> u32 {
        match self {
            Weekday::Sunday => 0,
            Weekday::Monday => 1,
            Weekday::Tuesday => 2,
            Weekday::Wednesday => 3,
            Weekday::Thursday => 4,
            Weekday::Friday => 5,
            Weekday::Saturday => 6,
        }
    }

    pub fn of(date: NaiveDate) -> Weekday {
        date.into()
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Weekday::Monday => "Mon",
            Weekday::Tuesday => "Tue",
            Weekday::Wednesday => "Wed",
            Weekday::Thursday => "Thu",
            Weekday::Friday => "Fri",
            Weekday::Saturday => "Sat",
            Weekday::Sunday => "Sun",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

impl From<NaiveDate> for Weekday {
    fn from(date: NaiveDate) -> Self {
        use chrono::Datelike;
        date.weekday().into()
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        };
        f.write_str(name)
    }
}

/// The weekdays chosen for recurrence together with the allowed count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekdaySelection {
    days: BTreeSet<Weekday>,
    pub min: usize,
    pub max: usize,
}

impl WeekdaySelection {
    pub fn new(max: usize) -> Self {
        WeekdaySelection {
            days: BTreeSet::new(),
            min: 1,
            max,
        }
    }

    pub fn with_days(max: usize, days: impl IntoIterator<Item = Weekday>) -> Self {
        WeekdaySelection {
            days: days.into_iter().collect(),
            min: 1,
            max,
        }
    }

    /// Flip a weekday. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, day: Weekday) -> bool {
        if self.days.remove(&day) {
            false
        } else {
            self.days.insert(day);
            true
        }
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.days.iter().copied()
    }

    pub fn first(&self) -> Option<Weekday> {
        self.days.first().copied()
    }

    pub fn within_bounds(&self) -> bool {
        (self.min..=self.max).contains(&self.days.len())
    }

    /// True when no further weekday may be added.
    pub fn is_full(&self) -> bool {
        self.days.len() >= self.max
    }
}

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Length of the range in seconds, midnight to midnight.
    pub fn span_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// Start and end time of one weekday's training.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: NaiveTime,
    pub to: NaiveTime,
}

impl TimeWindow {
    /// `from` strictly before `to`, compared as (hour, minute).
    pub fn is_ordered(&self) -> bool {
        (self.from.hour(), self.from.minute()) < (self.to.hour(), self.to.minute())
    }
}

/// Time window as typed into the form, before parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeWindowInput {
    pub from: String,
    pub to: String,
}

impl TimeWindowInput {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        TimeWindowInput {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn from_window(window: TimeWindow) -> Self {
        TimeWindowInput::new(
            window.from.format("%H:%M").to_string(),
            window.to.format("%H:%M").to_string(),
        )
    }

    /// Parse both fields as "HH:MM". Seconds are accepted and ignored.
    pub fn parse(&self) -> Option<TimeWindow> {
        let parse = |s: &str| {
            let s = s.trim();
            NaiveTime::parse_from_str(s, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
                .ok()
        };
        Some(TimeWindow {
            from: parse(&self.from)?,
            to: parse(&self.to)?,
        })
    }
}

/// One concrete calendar date of a selected weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub weekday: Weekday,
    pub date: NaiveDate,
    pub active: bool,
}

impl Occurrence {
    pub fn key(&self) -> DateKey {
        DateKey(self.date)
    }

    pub fn label(&self) -> String {
        calendar::format_display_date(self.date)
    }
}

/// A submitted training: everything the editor accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Training {
    pub name: String,
    pub range: DateRange,
    pub per_week: Option<usize>,
    pub days: Vec<TrainingDay>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingDay {
    pub weekday: Weekday,
    pub window: TimeWindow,
    /// Active occurrence dates, ascending.
    pub dates: Vec<NaiveDate>,
}

/// One concrete training with start and end time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Session {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Training {
    pub fn weekdays(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.days.iter().map(|d| d.weekday)
    }

    /// All sessions in chronological order.
    pub fn sessions(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self
            .days
            .iter()
            .flat_map(|day| {
                day.dates.iter().map(move |date| Session {
                    start: date.and_time(day.window.from),
                    end: date.and_time(day.window.to),
                })
            })
            .collect();
        sessions.sort();
        sessions
    }

    pub fn weekdays_label(&self) -> String {
        self.weekdays()
            .map(Weekday::short_label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
