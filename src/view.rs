use crate::calendar::DateKey;
use crate::engine::TrainingEditor;
use crate::schedule::Weekday;
use crate::validate::{FieldError, FieldErrors, FieldId};

/// Message attached to a control, and whether it was forced to the
/// operator's attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub reported: bool,
}

impl From<&FieldError> for Notice {
    fn from(e: &FieldError) -> Self {
        Notice {
            message: e.error.to_string(),
            reported: e.reported,
        }
    }
}

fn notice(errors: &FieldErrors, field: FieldId) -> Option<Notice> {
    errors.get(field).map(Notice::from)
}

/// Everything the editor page renders, derived from the model.
#[derive(Debug, Clone)]
pub struct EditorView {
    pub name: String,
    pub date_start: String,
    pub date_end: String,
    pub date_error: Option<Notice>,
    /// Dates are only generated for a valid range.
    pub range_valid: bool,
    pub per_week: Option<PerWeekView>,
    pub max_weekdays: usize,
    pub weekdays: Vec<WeekdayView>,
}

#[derive(Debug, Clone)]
pub struct PerWeekView {
    pub value: String,
    pub max: usize,
    pub error: Option<Notice>,
}

#[derive(Debug, Clone)]
pub struct WeekdayView {
    pub weekday: Weekday,
    pub selected: bool,
    /// Advisory only: the per-week field is already satisfied.
    pub toggle_disabled: bool,
    pub error: Option<Notice>,
    pub from: String,
    pub to: String,
    /// Shown, enabled and required while the weekday is selected.
    pub time_enabled: bool,
    pub time_error: Option<Notice>,
    pub occurrences: Vec<OccurrenceView>,
}

#[derive(Debug, Clone)]
pub struct OccurrenceView {
    pub key: DateKey,
    pub label: String,
    pub checked: bool,
    pub disabled: bool,
    pub error: Option<Notice>,
}

impl EditorView {
    pub fn project(editor: &TrainingEditor) -> Self {
        let errors = editor.errors();
        let bound = editor.settings().weekday_bound;
        let selection = editor.selection();

        let per_week = bound.uses_per_week_field().then(|| PerWeekView {
            value: editor.per_week().map(|n| n.to_string()).unwrap_or_default(),
            max: bound.max(),
            error: notice(errors, FieldId::PerWeek),
        });
        let per_week_satisfied =
            bound.uses_per_week_field() && editor.per_week().is_some() && selection.is_full();

        let weekdays = Weekday::ALL
            .into_iter()
            .map(|weekday| {
                let selected = selection.contains(weekday);
                let input = editor.window_input(weekday);
                let occurrences = editor
                    .occurrences(weekday)
                    .iter()
                    .map(|o| OccurrenceView {
                        key: o.key(),
                        label: o.label(),
                        checked: o.active,
                        disabled: editor.is_locked(o),
                        error: notice(errors, FieldId::Occurrence(o.key())),
                    })
                    .collect();
                WeekdayView {
                    weekday,
                    selected,
                    toggle_disabled: per_week_satisfied && !selected,
                    error: notice(errors, FieldId::Weekday(weekday)),
                    from: input.from,
                    to: input.to,
                    time_enabled: selected,
                    time_error: notice(errors, FieldId::TimeTo(weekday)),
                    occurrences,
                }
            })
            .collect();

        EditorView {
            name: editor.name().to_string(),
            date_start: editor.date_start().to_string(),
            date_end: editor.date_end().to_string(),
            date_error: notice(errors, FieldId::DateEnd),
            range_valid: errors.get(FieldId::DateEnd).is_none(),
            per_week,
            max_weekdays: selection.max,
            weekdays,
        }
    }

    pub fn has_reported_errors(&self) -> bool {
        let reported = |n: &Option<Notice>| n.as_ref().is_some_and(|n| n.reported);
        reported(&self.date_error)
            || self.per_week.as_ref().is_some_and(|p| reported(&p.error))
            || self.weekdays.iter().any(|w| {
                reported(&w.error)
                    || reported(&w.time_error)
                    || w.occurrences.iter().any(|o| reported(&o.error))
            })
    }
}
