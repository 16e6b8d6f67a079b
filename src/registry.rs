use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::EditorSettings;
use crate::engine::TrainingEditor;
use crate::overrides::{OverrideStore, SessionEvent};
use crate::schedule::{DateRange, Training};
use crate::validate::ValidationError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Mutex<Registry>>,
    pub settings: Arc<EditorSettings>,
}

impl AppState {
    pub fn new(settings: EditorSettings) -> Self {
        AppState {
            registry: Arc::new(Mutex::new(Registry::default())),
            settings: Arc::new(settings),
        }
    }
}

/// An open editor, whom it belongs to and its override store.
///
/// The store lives exactly as long as the session, so editors open in
/// other tabs of the same browser never see or clear each other's overrides.
pub struct EditorSession {
    pub client: String,
    /// Saved training being edited, `None` when creating.
    pub training_id: Option<u64>,
    pub editor: TrainingEditor,
    pub store: OverrideStore,
}

/// Saved trainings and open editor sessions.
#[derive(Default)]
pub struct Registry {
    trainings: BTreeMap<u64, Training>,
    next_id: u64,
    editors: HashMap<Uuid, EditorSession>,
}

impl Registry {
    pub fn trainings(&self) -> impl Iterator<Item = (u64, &Training)> {
        self.trainings.iter().map(|(id, t)| (*id, t))
    }

    pub fn training(&self, id: u64) -> Option<&Training> {
        self.trainings.get(&id)
    }

    /// Store a training, replacing `id` if given. Returns its id.
    pub fn save(&mut self, id: Option<u64>, training: Training) -> u64 {
        let id = id.unwrap_or_else(|| {
            self.next_id += 1;
            self.next_id
        });
        self.trainings.insert(id, training);
        id
    }

    pub fn open_create(
        &mut self,
        settings: &EditorSettings,
        client: &str,
        range: DateRange,
    ) -> Uuid {
        let mut store = loaded_store(settings);
        let mut editor = TrainingEditor::new(settings.clone(), range);
        editor.load(&mut store);
        self.insert_session(client, None, editor, store)
    }

    pub fn open_edit(&mut self, settings: &EditorSettings, client: &str, id: u64) -> Option<Uuid> {
        let training = self.trainings.get(&id)?.clone();
        let mut store = loaded_store(settings);
        let editor = TrainingEditor::for_training(settings.clone(), &training, &mut store);
        Some(self.insert_session(client, Some(id), editor, store))
    }

    pub fn session(&self, sid: Uuid) -> Option<&EditorSession> {
        self.editors.get(&sid)
    }

    /// Run `f` against an open editor and its store.
    pub fn with_editor<R>(
        &mut self,
        sid: Uuid,
        f: impl FnOnce(&mut TrainingEditor, &mut OverrideStore) -> R,
    ) -> Option<R> {
        let session = self.editors.get_mut(&sid)?;
        Some(f(&mut session.editor, &mut session.store))
    }

    /// Submit an editor. On success the training is saved and the session
    /// is closed.
    pub fn submit(&mut self, sid: Uuid) -> Option<Result<u64, ValidationError>> {
        let session = self.editors.get_mut(&sid)?;
        let training = match session.editor.submit() {
            Ok(training) => training,
            Err(error) => return Some(Err(error)),
        };
        let training_id = session.training_id;
        let id = self.save(training_id, training);
        tracing::info!(%sid, id, "training saved");
        self.close(sid);
        Some(Ok(id))
    }

    /// End an editor session, emitting `Leave` on its store.
    /// Returns `None` if the session was already closed.
    pub fn close(&mut self, sid: Uuid) -> Option<EditorSession> {
        let mut session = self.editors.remove(&sid)?;
        let policy = session.editor.settings().session_boundary;
        session.store.apply_boundary(policy, SessionEvent::Leave);
        tracing::debug!(%sid, client = %session.client, "editor closed");
        Some(session)
    }

    fn insert_session(
        &mut self,
        client: &str,
        training_id: Option<u64>,
        editor: TrainingEditor,
        store: OverrideStore,
    ) -> Uuid {
        let sid = Uuid::new_v4();
        self.editors.insert(
            sid,
            EditorSession {
                client: client.to_string(),
                training_id,
                editor,
                store,
            },
        );
        tracing::debug!(%sid, client, ?training_id, "editor opened");
        sid
    }
}

/// Store for a new session with the `Load` boundary applied.
fn loaded_store(settings: &EditorSettings) -> OverrideStore {
    let mut store = OverrideStore::default();
    store.apply_boundary(settings.session_boundary, SessionEvent::Load);
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DateKey;
    use crate::engine::tests::{date, january};
    use crate::overrides::{Override, SessionBoundary};
    use crate::schedule::Weekday;

    fn settings(boundary: SessionBoundary) -> EditorSettings {
        EditorSettings {
            session_boundary: boundary,
            ..EditorSettings::default()
        }
    }

    fn fill(registry: &mut Registry, sid: Uuid) {
        registry
            .with_editor(sid, |editor, store| {
                editor.set_name("Kids");
                editor.on_weekday_toggled(store, Weekday::Monday);
                editor.on_time_field_changed(Weekday::Monday, "16:00", "17:00");
                editor.on_occurrence_toggled(store, DateKey(date(2024, 1, 8)));
            })
            .unwrap();
    }

    fn monday_states(registry: &Registry, sid: Uuid) -> Vec<bool> {
        let editor = &registry.session(sid).unwrap().editor;
        editor.occurrences(Weekday::Monday).iter().map(|o| o.active).collect()
    }

    fn toggle_monday(registry: &mut Registry, sid: Uuid) {
        registry
            .with_editor(sid, |editor, store| {
                editor.on_weekday_toggled(store, Weekday::Monday);
            })
            .unwrap();
    }

    #[test]
    fn test_submit_saves_and_closes() {
        let settings = settings(SessionBoundary::OnLeave);
        let mut registry = Registry::default();
        let sid = registry.open_create(&settings, "c1", january());
        fill(&mut registry, sid);
        assert_eq!(registry.session(sid).unwrap().store.len(), 1);

        let id = registry.submit(sid).unwrap().unwrap();
        assert_eq!(registry.training(id).unwrap().name, "Kids");
        assert!(registry.session(sid).is_none());
        assert!(registry.close(sid).is_none());
    }

    #[test]
    fn test_failed_submit_keeps_session() {
        let settings = settings(SessionBoundary::OnLeave);
        let mut registry = Registry::default();
        let sid = registry.open_create(&settings, "c1", january());
        assert_eq!(
            registry.submit(sid),
            Some(Err(ValidationError::NoWeekdaySelected))
        );
        assert!(registry.session(sid).is_some());
        assert_eq!(registry.trainings().count(), 0);
    }

    #[test]
    fn test_leave_boundary_follows_policy() {
        let mut registry = Registry::default();

        let on_leave = settings(SessionBoundary::OnLeave);
        let sid = registry.open_create(&on_leave, "c1", january());
        fill(&mut registry, sid);
        assert!(registry.close(sid).unwrap().store.is_empty());

        let on_load = settings(SessionBoundary::OnLoad);
        let sid = registry.open_create(&on_load, "c1", january());
        fill(&mut registry, sid);
        let closed = registry.close(sid).unwrap();
        assert_eq!(
            closed.store.get(DateKey(date(2024, 1, 8))),
            Some(Override::Deactivated)
        );
    }

    #[test]
    fn test_reopened_editor_starts_from_defaults() {
        let settings = settings(SessionBoundary::OnLeave);
        let mut registry = Registry::default();
        let first = registry.open_create(&settings, "c1", january());
        fill(&mut registry, first);
        assert_eq!(monday_states(&registry, first), vec![true, false, true, true]);
        registry.close(first).unwrap();

        let second = registry.open_create(&settings, "c1", january());
        toggle_monday(&mut registry, second);
        assert_eq!(monday_states(&registry, second), vec![true; 4]);
    }

    #[test]
    fn test_editors_of_one_client_keep_separate_overrides() {
        for boundary in [SessionBoundary::OnLoad, SessionBoundary::OnLeave] {
            let settings = settings(boundary);
            let mut registry = Registry::default();
            let first = registry.open_create(&settings, "c1", january());
            fill(&mut registry, first);
            toggle_monday(&mut registry, first);
            assert!(monday_states(&registry, first).is_empty());

            // another tab of the same browser opens, edits and closes
            let second = registry.open_create(&settings, "c1", january());
            toggle_monday(&mut registry, second);
            assert_eq!(monday_states(&registry, second), vec![true; 4]);
            registry.close(second).unwrap();

            toggle_monday(&mut registry, first);
            assert_eq!(
                monday_states(&registry, first),
                vec![true, false, true, true],
                "{boundary:?}"
            );
        }
    }

    #[test]
    fn test_edit_reopens_saved_training() {
        let settings = settings(SessionBoundary::OnLeave);
        let mut registry = Registry::default();
        let sid = registry.open_create(&settings, "c1", january());
        fill(&mut registry, sid);
        let id = registry.submit(sid).unwrap().unwrap();

        let edit = registry.open_edit(&settings, "c1", id).unwrap();
        let session = registry.session(edit).unwrap();
        assert_eq!(session.training_id, Some(id));
        assert_eq!(monday_states(&registry, edit), vec![true, false, true, true]);

        registry
            .with_editor(edit, |editor, store| {
                editor.on_occurrence_toggled(store, DateKey(date(2024, 1, 8)));
            })
            .unwrap();
        assert_eq!(registry.submit(edit), Some(Ok(id)));
        assert_eq!(registry.trainings().count(), 1);
        assert_eq!(registry.training(id).unwrap().days[0].dates.len(), 4);
    }

    #[test]
    fn test_unknown_ids() {
        let settings = EditorSettings::default();
        let mut registry = Registry::default();
        assert!(registry.open_edit(&settings, "c1", 7).is_none());
        assert!(registry.with_editor(Uuid::new_v4(), |_, _| ()).is_none());
        assert!(registry.submit(Uuid::new_v4()).is_none());
        assert!(registry.close(Uuid::new_v4()).is_none());
    }
}
