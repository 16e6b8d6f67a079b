use std::collections::HashMap;

use serde::Deserialize;

use crate::calendar::DateKey;

/// Session-scoped string key/value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
    fn clear(&mut self);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// State of an occurrence that has no override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultState {
    Active,
    Inactive,
}

impl DefaultState {
    pub fn is_active(self) -> bool {
        self == DefaultState::Active
    }
}

/// When the store of a browsing session is wiped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionBoundary {
    OnLoad,
    OnLeave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Load,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    Deactivated,
    Activated,
}

impl Override {
    const DEACTIVATED: &'static str = "0";
    const ACTIVATED: &'static str = "1";

    fn as_str(self) -> &'static str {
        match self {
            Override::Deactivated => Self::DEACTIVATED,
            Override::Activated => Self::ACTIVATED,
        }
    }

    // Any present value other than "1" means deactivated.
    fn parse(value: &str) -> Override {
        if value == Self::ACTIVATED {
            Override::Activated
        } else {
            Override::Deactivated
        }
    }
}

/// Explicit occurrence states keyed by date.
///
/// An entry exists only while an occurrence differs from the default state;
/// going back to the default removes the key.
#[derive(Debug, Default, Clone)]
pub struct OverrideStore<S = MemoryStore> {
    backend: S,
}

impl<S: KeyValueStore> OverrideStore<S> {
    pub fn new(backend: S) -> Self {
        OverrideStore { backend }
    }

    pub fn get(&self, key: DateKey) -> Option<Override> {
        self.backend
            .get(&key.to_string())
            .map(|value| Override::parse(&value))
    }

    pub fn is_active(&self, key: DateKey, default: DefaultState) -> bool {
        match self.get(key) {
            Some(Override::Deactivated) => false,
            Some(Override::Activated) => true,
            None => default.is_active(),
        }
    }

    /// Remember `active` for `key`, writing only what differs from `default`.
    pub fn record(&mut self, key: DateKey, active: bool, default: DefaultState) {
        let key_str = key.to_string();
        if active == default.is_active() {
            self.backend.remove(&key_str);
        } else {
            let marker = if active {
                Override::Activated
            } else {
                Override::Deactivated
            };
            tracing::debug!(%key, ?marker, "override recorded");
            self.backend.set(&key_str, marker.as_str());
        }
    }

    pub fn clear(&mut self) {
        self.backend.clear();
    }

    pub fn len(&self) -> usize {
        self.backend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    /// Clear the store if `event` is the configured boundary.
    /// Returns whether the store was cleared.
    pub fn apply_boundary(&mut self, policy: SessionBoundary, event: SessionEvent) -> bool {
        let clears = matches!(
            (policy, event),
            (SessionBoundary::OnLoad, SessionEvent::Load)
                | (SessionBoundary::OnLeave, SessionEvent::Leave)
        );
        if clears {
            tracing::debug!(?policy, entries = self.len(), "clearing override store");
            self.clear();
        }
        clears
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn key(d: u32) -> DateKey {
        DateKey(NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
    }

    #[test]
    fn test_default_active_writes_only_deactivations() {
        let mut store = OverrideStore::<MemoryStore>::default();
        store.record(key(1), true, DefaultState::Active);
        assert!(store.is_empty());

        store.record(key(8), false, DefaultState::Active);
        assert_eq!(store.get(key(8)), Some(Override::Deactivated));
        assert!(!store.is_active(key(8), DefaultState::Active));
        assert!(store.is_active(key(1), DefaultState::Active));

        store.record(key(8), true, DefaultState::Active);
        assert_eq!(store.get(key(8)), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_default_inactive_writes_activations() {
        let mut store = OverrideStore::<MemoryStore>::default();
        assert!(!store.is_active(key(1), DefaultState::Inactive));
        store.record(key(1), true, DefaultState::Inactive);
        assert_eq!(store.get(key(1)), Some(Override::Activated));
        assert!(store.is_active(key(1), DefaultState::Inactive));
        store.record(key(1), false, DefaultState::Inactive);
        assert!(store.is_empty());
    }

    #[test]
    fn test_keys_are_iso_dates() {
        let mut backend = MemoryStore::default();
        backend.set("2024-01-15", "0");
        let store = OverrideStore::new(backend);
        assert_eq!(store.get(key(15)), Some(Override::Deactivated));
    }

    #[test]
    fn test_unknown_value_reads_as_deactivated() {
        let mut backend = MemoryStore::default();
        backend.set("2024-01-15", "yes");
        let store = OverrideStore::new(backend);
        assert!(!store.is_active(key(15), DefaultState::Active));
    }

    #[test]
    fn test_boundary_on_leave() {
        let mut store = OverrideStore::<MemoryStore>::default();
        store.record(key(1), false, DefaultState::Active);
        assert!(!store.apply_boundary(SessionBoundary::OnLeave, SessionEvent::Load));
        assert_eq!(store.len(), 1);
        assert!(store.apply_boundary(SessionBoundary::OnLeave, SessionEvent::Leave));
        assert!(store.is_empty());
    }

    #[test]
    fn test_boundary_on_load() {
        let mut store = OverrideStore::<MemoryStore>::default();
        store.record(key(1), false, DefaultState::Active);
        assert!(!store.apply_boundary(SessionBoundary::OnLoad, SessionEvent::Leave));
        assert_eq!(store.len(), 1);
        assert!(store.apply_boundary(SessionBoundary::OnLoad, SessionEvent::Load));
        assert!(store.is_empty());
    }
}
