use chrono::NaiveDate;

use crate::calendar;
use crate::schedule::{DateRange, Weekday};

/// Dates of one weekday inside a range, earliest first, 7 days apart.
///
/// The end of the range is inclusive. Calling [`generate`] again with the
/// same arguments restarts the sequence.
#[derive(Debug, Clone)]
pub struct Occurrences {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next.filter(|d| *d <= self.end)?;
        self.next = calendar::add_days(current, 7);
        Some(current)
    }
}

pub fn generate(weekday: Weekday, range: &DateRange) -> Occurrences {
    Occurrences {
        next: calendar::first_on_or_after(range.start, weekday.index()),
        end: range.end,
    }
}
