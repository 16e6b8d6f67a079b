use serde::Deserialize;

use crate::engine::TrainingEditor;
use crate::schedule::Training;
use crate::validate::ValidationError;

/// How the gate treats failures after the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitMode {
    /// Stop at the first failing check.
    ShortCircuit,
    /// Run every check. Only the first failure is reported, the rest are
    /// attached silently.
    RunAll,
}

#[derive(Debug, Clone, Copy)]
enum Check {
    DateRange,
    WeekdaySelection,
    TimeWindows,
    Occurrences,
    OccurrenceDates,
}

impl Check {
    const ORDER: [Check; 5] = [
        Check::DateRange,
        Check::WeekdaySelection,
        Check::TimeWindows,
        Check::Occurrences,
        Check::OccurrenceDates,
    ];

    fn run(self, editor: &mut TrainingEditor, report: bool) -> Result<(), ValidationError> {
        match self {
            Check::DateRange => editor.check_range(report).map(|_| ()),
            Check::WeekdaySelection => editor.check_selection(None, report),
            Check::TimeWindows => editor.check_times(report),
            Check::Occurrences => editor.check_occurrences(report),
            Check::OccurrenceDates => editor.check_occurrence_dates(report),
        }
    }
}

/// Runs every check before a training is accepted.
pub struct FormSubmissionGate {
    mode: SubmitMode,
}

impl FormSubmissionGate {
    pub fn new(mode: SubmitMode) -> Self {
        FormSubmissionGate { mode }
    }

    /// Validate the editor. On success the controls locked for display are
    /// released and the accepted training is returned.
    pub fn run(&self, editor: &mut TrainingEditor) -> Result<Training, ValidationError> {
        let mut first: Option<ValidationError> = None;

        for check in Check::ORDER {
            let report = first.is_none();
            if let Err(error) = check.run(editor, report) {
                tracing::debug!(?check, %error, "submission check failed");
                if first.is_none() {
                    first = Some(error);
                }
                if self.mode == SubmitMode::ShortCircuit {
                    break;
                }
            }
        }

        if let Some(error) = first {
            return Err(error);
        }

        editor.release_controls();
        editor.build_training()
    }
}
