//! Validators over the editor model.
//!
//! Each check is a pure function returning either the validated value or a
//! [`Failure`] naming the control the message belongs to. Attaching and
//! clearing messages is done by the caller through [`FieldErrors`].

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::calendar::{self, DateKey};
use crate::schedule::{
    DateRange, Occurrence, TimeWindow, TimeWindowInput, Weekday, WeekdaySelection,
};

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("A recurring training must span at least {min_days} days")]
    RangeTooShort { min_days: i64 },

    #[error("No weekday is selected for the recurrence")]
    NoWeekdaySelected,

    #[error("At most {max} weekdays can be selected")]
    TooManyWeekdaysSelected { max: usize },

    #[error("Between 1 and {max} trainings per week can be set")]
    PerWeekOutOfRange { max: usize },

    #[error("{selected} weekdays selected but {expected} trainings per week are set")]
    WeekdayCountMismatch { expected: usize, selected: usize },

    #[error("The training on {weekday} ends before it starts")]
    TimeWindowInverted { weekday: Weekday },

    #[error("At least one training must take place on {weekday}")]
    NoActiveOccurrenceForWeekday { weekday: Weekday },

    #[error("Invalid training date {}", .date.format(calendar::DISPLAY_FORMAT))]
    OccurrenceDateMismatch { date: NaiveDate },
}

/// A control in the editor that can carry a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldId {
    DateEnd,
    PerWeek,
    Weekday(Weekday),
    TimeTo(Weekday),
    Occurrence(DateKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub field: FieldId,
    pub error: ValidationError,
}

impl Failure {
    fn new(field: FieldId, error: ValidationError) -> Self {
        Failure { field, error }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub error: ValidationError,
    /// Forced to the operator's attention rather than only attached.
    pub reported: bool,
}

/// Messages currently attached to controls.
#[derive(Debug, Clone, Default)]
pub struct FieldErrors {
    entries: BTreeMap<FieldId, FieldError>,
}

impl FieldErrors {
    pub fn set(&mut self, failure: &Failure, report: bool) {
        self.entries.insert(
            failure.field,
            FieldError {
                error: failure.error.clone(),
                reported: report,
            },
        );
    }

    pub fn clear(&mut self, field: FieldId) {
        self.entries.remove(&field);
    }

    pub fn clear_where(&mut self, mut pred: impl FnMut(&FieldId, &ValidationError) -> bool) {
        self.entries.retain(|field, e| !pred(field, &e.error));
    }

    pub fn get(&self, field: FieldId) -> Option<&FieldError> {
        self.entries.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn reported(&self) -> impl Iterator<Item = (&FieldId, &FieldError)> {
        self.entries.iter().filter(|(_, e)| e.reported)
    }
}

/// Parse both dates and require the configured minimum span.
///
/// Unparseable input fails the same way as a short range.
pub fn check_date_range(start: &str, end: &str, min_days: i64) -> Result<DateRange, Failure> {
    let too_short = || Failure::new(FieldId::DateEnd, ValidationError::RangeTooShort { min_days });

    let start = calendar::parse_display_date(start).ok_or_else(too_short)?;
    let end = calendar::parse_display_date(end).ok_or_else(too_short)?;
    let range = DateRange::new(start, end);
    let min_seconds = min_days.checked_mul(SECONDS_PER_DAY).ok_or_else(too_short)?;
    if range.span_seconds() < min_seconds {
        return Err(too_short());
    }
    Ok(range)
}

/// Selection must be non-empty and not exceed its maximum.
///
/// An empty selection reports on the first weekday control; too many on
/// `anchor` (the control just toggled) or the first selected weekday.
pub fn check_weekday_selection(
    selection: &WeekdaySelection,
    anchor: Option<Weekday>,
) -> Result<(), Failure> {
    if selection.within_bounds() {
        return Ok(());
    }
    if selection.is_empty() {
        return Err(Failure::new(
            FieldId::Weekday(Weekday::ALL[0]),
            ValidationError::NoWeekdaySelected,
        ));
    }
    let day = anchor
        .or_else(|| selection.first())
        .unwrap_or(Weekday::ALL[0]);
    Err(Failure::new(
        FieldId::Weekday(day),
        ValidationError::TooManyWeekdaysSelected { max: selection.max },
    ))
}

/// When an occurrences-per-week value is set, it must lie in `1..=max` and
/// the selection must match it.
pub fn check_weekday_count(
    selection: &WeekdaySelection,
    per_week: Option<usize>,
    max: usize,
) -> Result<(), Failure> {
    match per_week {
        Some(n) if n == 0 || n > max => Err(Failure::new(
            FieldId::PerWeek,
            ValidationError::PerWeekOutOfRange { max },
        )),
        Some(expected) if expected != selection.len() => Err(Failure::new(
            FieldId::PerWeek,
            ValidationError::WeekdayCountMismatch {
                expected,
                selected: selection.len(),
            },
        )),
        _ => Ok(()),
    }
}

pub fn check_time_window(weekday: Weekday, input: &TimeWindowInput) -> Result<TimeWindow, Failure> {
    input.parse().filter(TimeWindow::is_ordered).ok_or_else(|| {
        Failure::new(
            FieldId::TimeTo(weekday),
            ValidationError::TimeWindowInverted { weekday },
        )
    })
}

/// At least one occurrence of the weekday must stay active.
pub fn check_active_occurrences(
    weekday: Weekday,
    occurrences: &[Occurrence],
) -> Result<(), Failure> {
    if occurrences.iter().any(|o| o.active) {
        return Ok(());
    }
    let field = occurrences
        .iter()
        .find(|o| !o.active)
        .map_or(FieldId::Weekday(weekday), |o| FieldId::Occurrence(o.key()));
    Err(Failure::new(field, ValidationError::NoActiveOccurrenceForWeekday { weekday }))
}

/// Every active occurrence must fall on its weekday and inside the range.
pub fn check_occurrence_dates<'a>(
    occurrences: impl IntoIterator<Item = &'a Occurrence>,
    range: &DateRange,
) -> Result<(), Failure> {
    for occurrence in occurrences.into_iter().filter(|o| o.active) {
        if Weekday::of(occurrence.date) != occurrence.weekday || !range.contains(occurrence.date) {
            return Err(Failure::new(
                FieldId::Occurrence(occurrence.key()),
                ValidationError::OccurrenceDateMismatch { date: occurrence.date },
            ));
        }
    }
    Ok(())
}
