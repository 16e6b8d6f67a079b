//! Regeneration engine behind the training editor.
//!
//! The editor owns the pure model (date range input, weekday selection, time
//! windows, per-weekday occurrences) and exposes one callback per user
//! interaction. The override store is passed into every callback that may
//! regenerate, so it is written from exactly one place.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::calendar::{self, DateKey};
use crate::config::EditorSettings;
use crate::gate::FormSubmissionGate;
use crate::generator;
use crate::overrides::{DefaultState, KeyValueStore, OverrideStore};
use crate::schedule::{
    DateRange, Occurrence, TimeWindowInput, Training, TrainingDay, Weekday, WeekdaySelection,
};
use crate::validate::{self, FieldErrors, FieldId, ValidationError};
use crate::view::EditorView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorFlow {
    Create,
    Edit,
}

#[derive(Debug, Clone)]
pub struct TrainingEditor {
    settings: EditorSettings,
    flow: EditorFlow,
    name: String,
    date_start: String,
    date_end: String,
    per_week: Option<usize>,
    selection: WeekdaySelection,
    windows: BTreeMap<Weekday, TimeWindowInput>,
    occurrences: BTreeMap<Weekday, Vec<Occurrence>>,
    errors: FieldErrors,
    // Set by the gate after a successful submit; locked controls render enabled.
    controls_released: bool,
}

impl TrainingEditor {
    /// Empty editor for a new training over `range`.
    pub fn new(settings: EditorSettings, range: DateRange) -> Self {
        let max = settings.weekday_bound.limit(None);
        TrainingEditor {
            settings,
            flow: EditorFlow::Create,
            name: String::new(),
            date_start: calendar::format_display_date(range.start),
            date_end: calendar::format_display_date(range.end),
            per_week: None,
            selection: WeekdaySelection::new(max),
            windows: Weekday::ALL
                .into_iter()
                .map(|d| (d, TimeWindowInput::default()))
                .collect(),
            occurrences: BTreeMap::new(),
            errors: FieldErrors::default(),
            controls_released: false,
        }
    }

    /// Editor pre-filled from a saved training.
    ///
    /// Occurrences whose saved state differs from the edit default are
    /// written to `store`, so call this after any on-load clear.
    pub fn for_training<S: KeyValueStore>(
        settings: EditorSettings,
        training: &Training,
        store: &mut OverrideStore<S>,
    ) -> Self {
        let mut editor = TrainingEditor::new(settings, training.range);
        editor.flow = EditorFlow::Edit;
        editor.name = training.name.clone();
        if editor.settings.weekday_bound.uses_per_week_field() {
            editor.per_week = training.per_week;
        }
        editor.selection = WeekdaySelection::with_days(
            editor.settings.weekday_bound.limit(editor.per_week),
            training.weekdays(),
        );

        let default = editor.default_state();
        for day in &training.days {
            editor
                .windows
                .insert(day.weekday, TimeWindowInput::from_window(day.window));
            for date in generator::generate(day.weekday, &training.range) {
                store.record(DateKey(date), day.dates.contains(&date), default);
            }
        }
        editor.load(store);
        editor
    }

    /// Initial pass after the editor is shown.
    pub fn load<S: KeyValueStore>(&mut self, store: &mut OverrideStore<S>) {
        let range = self.check_range(false).ok();
        self.regenerate(store, range);
    }

    pub fn default_state(&self) -> DefaultState {
        match self.flow {
            EditorFlow::Create => self.settings.create_default,
            EditorFlow::Edit => self.settings.edit_default,
        }
    }

    pub fn on_date_range_changed<S: KeyValueStore>(
        &mut self,
        store: &mut OverrideStore<S>,
        start: &str,
        end: &str,
    ) {
        self.date_start = start.trim().to_string();
        self.date_end = end.trim().to_string();
        let range = self.check_range(false).ok();
        self.regenerate(store, range);
    }

    /// Returns whether the weekday is selected afterwards.
    pub fn on_weekday_toggled<S: KeyValueStore>(
        &mut self,
        store: &mut OverrideStore<S>,
        weekday: Weekday,
    ) -> bool {
        let selected = self.selection.toggle(weekday);
        if !selected {
            self.errors.clear(FieldId::TimeTo(weekday));
            self.errors.clear_where(|_, e| is_no_active_for(e, weekday));
        }
        let _ = self.check_selection(Some(weekday), true);

        let range = self.current_range();
        self.regenerate(store, range);
        selected
    }

    pub fn on_time_field_changed(&mut self, weekday: Weekday, from: &str, to: &str) {
        self.windows
            .insert(weekday, TimeWindowInput::new(from.trim(), to.trim()));
        if self.selection.contains(weekday) {
            let _ = self.check_time(weekday, false);
        }
    }

    /// Occurrences-per-week field changed. Empty or unparseable input unsets
    /// it; a value outside `1..=max` is kept and flagged on the field.
    pub fn on_per_week_changed(&mut self, value: &str) {
        if !self.settings.weekday_bound.uses_per_week_field() {
            return;
        }
        self.per_week = value.trim().parse::<usize>().ok();
        self.selection.max = self.settings.weekday_bound.limit(self.per_week);
        let _ = self.check_selection(None, false);
    }

    /// Flip one occurrence. Returns false if it is unknown or locked.
    pub fn on_occurrence_toggled<S: KeyValueStore>(
        &mut self,
        store: &mut OverrideStore<S>,
        key: DateKey,
    ) -> bool {
        let default = self.default_state();
        let Some(weekday) = self.find_occurrence(key).map(|o| o.weekday) else {
            tracing::debug!(%key, "toggle for unknown occurrence");
            return false;
        };
        if self.find_occurrence(key).is_some_and(|o| self.is_locked(o)) {
            tracing::debug!(%key, "occurrence is the last active one and locked");
            return false;
        }

        let Some(occurrence) = self
            .occurrences
            .get_mut(&weekday)
            .and_then(|list| list.iter_mut().find(|o| o.key() == key))
        else {
            return false;
        };
        occurrence.active = !occurrence.active;
        let active = occurrence.active;
        store.record(key, active, default);
        self.controls_released = false;

        if active {
            self.errors.clear_where(|_, e| is_no_active_for(e, weekday));
        } else {
            let _ = self.check_occurrences_of(weekday, true);
        }
        true
    }

    /// Run the gate and return the accepted training.
    pub fn submit(&mut self) -> Result<Training, ValidationError> {
        FormSubmissionGate::new(self.settings.submit_mode).run(self)
    }

    pub fn view(&self) -> EditorView {
        EditorView::project(self)
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn flow(&self) -> EditorFlow {
        self.flow
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.trim().to_string();
    }

    pub fn date_start(&self) -> &str {
        &self.date_start
    }

    pub fn date_end(&self) -> &str {
        &self.date_end
    }

    pub fn per_week(&self) -> Option<usize> {
        self.per_week
    }

    pub fn selection(&self) -> &WeekdaySelection {
        &self.selection
    }

    pub fn window_input(&self, weekday: Weekday) -> TimeWindowInput {
        self.windows.get(&weekday).cloned().unwrap_or_default()
    }

    pub fn occurrences(&self, weekday: Weekday) -> &[Occurrence] {
        self.occurrences.get(&weekday).map_or(&[], Vec::as_slice)
    }

    pub fn all_occurrences(&self) -> impl Iterator<Item = &Occurrence> {
        self.occurrences.values().flatten()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    #[cfg(test)]
    pub fn controls_released(&self) -> bool {
        self.controls_released
    }

    /// Whether toggling this occurrence is disabled for display.
    pub fn is_locked(&self, occurrence: &Occurrence) -> bool {
        self.settings.lock_last_active
            && !self.controls_released
            && occurrence.active
            && self.active_count(occurrence.weekday) == 1
    }

    pub fn active_count(&self, weekday: Weekday) -> usize {
        self.occurrences(weekday).iter().filter(|o| o.active).count()
    }

    fn find_occurrence(&self, key: DateKey) -> Option<&Occurrence> {
        self.all_occurrences().find(|o| o.key() == key)
    }

    fn current_range(&self) -> Option<DateRange> {
        validate::check_date_range(&self.date_start, &self.date_end, self.settings.min_range_days)
            .ok()
    }

    /// Save current states, drop the rendered occurrences and rebuild them
    /// for every selected weekday when `range` is valid.
    fn regenerate<S: KeyValueStore>(
        &mut self,
        store: &mut OverrideStore<S>,
        range: Option<DateRange>,
    ) {
        let default = self.default_state();
        for occurrence in self.occurrences.values().flatten() {
            store.record(occurrence.key(), occurrence.active, default);
        }

        self.occurrences.clear();
        self.errors
            .clear_where(|field, _| matches!(field, FieldId::Occurrence(_)));
        self.controls_released = false;

        let Some(range) = range else {
            tracing::debug!("date range invalid, no occurrences generated");
            return;
        };

        for weekday in self.selection.iter() {
            let list: Vec<Occurrence> = generator::generate(weekday, &range)
                .map(|date| Occurrence {
                    weekday,
                    date,
                    active: store.is_active(DateKey(date), default),
                })
                .collect();
            self.occurrences.insert(weekday, list);
        }
        // Time fields follow the selection; the view derives their state.

        tracing::debug!(
            weekdays = self.selection.len(),
            occurrences = self.all_occurrences().count(),
            overrides = store.len(),
            "regenerated occurrences"
        );
    }

    pub(crate) fn check_range(&mut self, report: bool) -> Result<DateRange, ValidationError> {
        let min_days = self.settings.min_range_days;
        match validate::check_date_range(&self.date_start, &self.date_end, min_days) {
            Ok(range) => {
                self.errors.clear(FieldId::DateEnd);
                Ok(range)
            }
            Err(failure) => {
                self.errors.set(&failure, report);
                Err(failure.error)
            }
        }
    }

    pub(crate) fn check_selection(
        &mut self,
        anchor: Option<Weekday>,
        report: bool,
    ) -> Result<(), ValidationError> {
        self.errors
            .clear_where(|field, _| matches!(field, FieldId::Weekday(_)));
        let selection = validate::check_weekday_selection(&self.selection, anchor);
        if let Err(failure) = &selection {
            self.errors.set(failure, report);
        }

        let max = self.settings.weekday_bound.max();
        let count = validate::check_weekday_count(&self.selection, self.per_week, max);
        match &count {
            Ok(()) => self.errors.clear(FieldId::PerWeek),
            // While toggling weekdays the count is expected to differ; it is
            // reported on save.
            Err(failure) => self.errors.set(
                failure,
                report && anchor.is_none() && selection.is_ok(),
            ),
        }

        selection.and(count).map_err(|failure| failure.error)
    }

    fn check_time(&mut self, weekday: Weekday, report: bool) -> Result<(), ValidationError> {
        match validate::check_time_window(weekday, &self.window_input(weekday)) {
            Ok(_) => {
                self.errors.clear(FieldId::TimeTo(weekday));
                Ok(())
            }
            Err(failure) => {
                self.errors.set(&failure, report);
                Err(failure.error)
            }
        }
    }

    pub(crate) fn check_times(&mut self, report: bool) -> Result<(), ValidationError> {
        let days: Vec<Weekday> = self.selection.iter().collect();
        let mut first = Ok(());
        for day in days {
            let result = self.check_time(day, report && first.is_ok());
            if first.is_ok() {
                first = result;
            }
        }
        first
    }

    fn check_occurrences_of(
        &mut self,
        weekday: Weekday,
        report: bool,
    ) -> Result<(), ValidationError> {
        match validate::check_active_occurrences(weekday, self.occurrences(weekday)) {
            Ok(()) => {
                self.errors.clear_where(|_, e| is_no_active_for(e, weekday));
                Ok(())
            }
            Err(failure) => {
                self.errors.set(&failure, report);
                Err(failure.error)
            }
        }
    }

    pub(crate) fn check_occurrences(&mut self, report: bool) -> Result<(), ValidationError> {
        let days: Vec<Weekday> = self.selection.iter().collect();
        let mut first = Ok(());
        for day in days {
            let result = self.check_occurrences_of(day, report && first.is_ok());
            if first.is_ok() {
                first = result;
            }
        }
        first
    }

    pub(crate) fn check_occurrence_dates(&mut self, report: bool) -> Result<(), ValidationError> {
        // An unusable range already failed the range check.
        let Some(range) = self.current_range() else {
            return Ok(());
        };
        let selected: Vec<&Occurrence> = self
            .selection
            .iter()
            .flat_map(|d| self.occurrences(d))
            .collect();
        match validate::check_occurrence_dates(selected, &range) {
            Ok(()) => {
                self.errors.clear_where(|_, e| {
                    matches!(e, ValidationError::OccurrenceDateMismatch { .. })
                });
                Ok(())
            }
            Err(failure) => {
                self.errors.set(&failure, report);
                Err(failure.error)
            }
        }
    }

    /// Re-enable controls that were disabled for display only.
    pub(crate) fn release_controls(&mut self) {
        self.controls_released = true;
    }

    /// Assemble the accepted training from the current model.
    pub(crate) fn build_training(&self) -> Result<Training, ValidationError> {
        let min_days = self.settings.min_range_days;
        let range = validate::check_date_range(&self.date_start, &self.date_end, min_days)
            .map_err(|f| f.error)?;
        let days = self
            .selection
            .iter()
            .map(|weekday| {
                let window = validate::check_time_window(weekday, &self.window_input(weekday))
                    .map_err(|f| f.error)?;
                let dates: Vec<NaiveDate> = self
                    .occurrences(weekday)
                    .iter()
                    .filter(|o| o.active)
                    .map(|o| o.date)
                    .collect();
                Ok(TrainingDay { weekday, window, dates })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(Training {
            name: self.name.clone(),
            range,
            per_week: self.per_week,
            days,
        })
    }

    #[cfg(test)]
    pub(crate) fn occurrences_mut(&mut self) -> &mut BTreeMap<Weekday, Vec<Occurrence>> {
        &mut self.occurrences
    }
}

fn is_no_active_for(error: &ValidationError, weekday: Weekday) -> bool {
    matches!(error, ValidationError::NoActiveOccurrenceForWeekday { weekday: w } if *w == weekday)
}
