use axum::{Router, extract::State, response::Html, routing::get};
use hypertext::{Raw, prelude::*};
use uuid::Uuid;

use crate::calendar::DateKey;
use crate::config::{EditorSettings, WeekdayBound};
use crate::engine::TrainingEditor;
use crate::overrides::{MemoryStore, OverrideStore};
use crate::registry::AppState;
use crate::schedule::{DateRange, Weekday};
use crate::trainings::render_editor;

pub fn router() -> Router<AppState> {
    Router::new().route("/editor", get(editor_states))
}

fn range() -> DateRange {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let end = chrono::NaiveDate::from_ymd_opt(2024, 1, 29).unwrap_or_default();
    DateRange::new(start, end)
}

/// Editors in fixed states, each with a throwaway store.
pub fn demo_editors(settings: &EditorSettings) -> Vec<(&'static str, TrainingEditor)> {
    type Script = fn(&mut TrainingEditor, &mut OverrideStore<MemoryStore>);
    let scripted = |script: Script, settings: EditorSettings| {
        let mut store = OverrideStore::default();
        let mut editor = TrainingEditor::new(settings, range());
        editor.load(&mut store);
        script(&mut editor, &mut store);
        editor
    };

    let per_week = EditorSettings {
        weekday_bound: WeekdayBound::PerWeek {
            max: settings.weekday_bound.max(),
        },
        ..settings.clone()
    };
    let locking = EditorSettings {
        lock_last_active: true,
        ..settings.clone()
    };

    vec![
        (
            "Valid",
            scripted(
                |editor, store| {
                    editor.set_name("Juniors");
                    editor.on_weekday_toggled(store, Weekday::Monday);
                    editor.on_weekday_toggled(store, Weekday::Thursday);
                    editor.on_time_field_changed(Weekday::Monday, "17:00", "18:30");
                    editor.on_time_field_changed(Weekday::Thursday, "17:00", "18:30");
                    let third_monday = range().start + chrono::Days::new(14);
                    editor.on_occurrence_toggled(store, DateKey(third_monday));
                },
                settings.clone(),
            ),
        ),
        (
            "Range too short",
            scripted(
                |editor, store| {
                    editor.on_weekday_toggled(store, Weekday::Tuesday);
                    editor.on_date_range_changed(store, "1. 1. 2024", "8. 1. 2024");
                },
                settings.clone(),
            ),
        ),
        (
            "Too many weekdays",
            scripted(
                |editor, store| {
                    for day in Weekday::ALL {
                        editor.on_weekday_toggled(store, day);
                    }
                },
                settings.clone(),
            ),
        ),
        (
            "All occurrences deactivated",
            scripted(
                |editor, store| {
                    editor.on_weekday_toggled(store, Weekday::Friday);
                    let keys: Vec<DateKey> = editor
                        .occurrences(Weekday::Friday)
                        .iter()
                        .map(|o| o.key())
                        .collect();
                    for key in keys {
                        editor.on_occurrence_toggled(store, key);
                    }
                },
                settings.clone(),
            ),
        ),
        (
            "Last active occurrence locked",
            scripted(
                |editor, store| {
                    editor.on_weekday_toggled(store, Weekday::Saturday);
                    let keys: Vec<DateKey> = editor
                        .occurrences(Weekday::Saturday)
                        .iter()
                        .map(|o| o.key())
                        .collect();
                    for key in keys {
                        editor.on_occurrence_toggled(store, key);
                    }
                },
                locking,
            ),
        ),
        (
            "Trainings per week",
            scripted(
                |editor, store| {
                    editor.on_per_week_changed("2");
                    editor.on_weekday_toggled(store, Weekday::Wednesday);
                },
                per_week,
            ),
        ),
    ]
}

// GET /storybook/editor - Show the editor in every canned state
async fn editor_states(State(state): State<AppState>) -> Html<String> {
    let editors: Vec<String> = demo_editors(&state.settings)
        .iter()
        .map(|(label, editor)| {
            let editor_html = render_editor(Uuid::nil(), editor);
            maud! {
                section .story {
                    h2 { (*label) }
                    (Raw::dangerously_create(&editor_html))
                }
            }
            .render()
            .into_inner()
        })
        .collect();

    let editors_html = editors.join("\n");

    let html = maud! {
        !DOCTYPE
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Training Editor - Storybook" }
                link rel="stylesheet" href="/static/app.css";
                script src="https://unpkg.com/htmx.org@2.0.4" {}
            }
            body {
                h1 { "Training Editor Storybook" }
                p { "The editor in fixed states. Events are not wired to a session." }

                div .story-grid {
                    (Raw::dangerously_create(&editors_html))
                }
            }
        }
    };

    Html(html.render().into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{FieldId, ValidationError};

    fn find<'a>(editors: &'a [(&str, TrainingEditor)], label: &str) -> &'a TrainingEditor {
        editors
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, e)| e)
            .unwrap()
    }

    #[test]
    fn test_demo_states() {
        let editors = demo_editors(&EditorSettings::default());
        let get = |label: &str| find(&editors, label);

        assert!(get("Valid").errors().is_empty());
        assert!(get("Valid").clone().submit().is_ok());
        assert!(get("Range too short").errors().get(FieldId::DateEnd).is_some());
        let sunday = FieldId::Weekday(Weekday::Sunday);
        assert_eq!(
            get("Too many weekdays").errors().get(sunday).map(|e| e.error.clone()),
            Some(ValidationError::TooManyWeekdaysSelected { max: 3 })
        );
        assert_eq!(get("All occurrences deactivated").active_count(Weekday::Friday), 0);
        assert_eq!(get("Last active occurrence locked").active_count(Weekday::Saturday), 1);
        assert!(get("Trainings per week").errors().get(FieldId::PerWeek).is_some());
    }
}
