use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::gate::SubmitMode;
use crate::overrides::{DefaultState, SessionBoundary};

/// Upper bound for `min_range_days`, about a century.
const MAX_RANGE_DAYS: i64 = 36_500;

/// Global timezone setting for the application
static APP_TIMEZONE: OnceLock<Tz> = OnceLock::new();

/// Initialize the timezone from the given string
pub fn init_timezone(tz_str: &str) {
    let timezone: Tz = tz_str.parse().unwrap_or_else(|_| {
        tracing::warn!(timezone = tz_str, "invalid timezone, falling back to UTC");
        chrono_tz::UTC
    });

    if APP_TIMEZONE.set(timezone).is_err() {
        tracing::warn!("timezone already initialized");
    }
}

/// Get the configured timezone
pub fn get_timezone() -> Tz {
    *APP_TIMEZONE.get().unwrap_or(&chrono_tz::UTC)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind: String,
    pub timezone: String,
    pub editor: EditorSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind: "0.0.0.0:3000".to_string(),
            timezone: "UTC".to_string(),
            editor: EditorSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load the config file, or fall back to defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(AppConfig::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(raw)?;
        config.editor.check()?;
        Ok(config)
    }
}

/// Upper bound on the number of selected weekdays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeekdayBound {
    /// Hard-coded maximum.
    Fixed { max: usize },
    /// Derived from an "occurrences per week" field that itself may not
    /// exceed `max`; the selection must match that field exactly.
    PerWeek { max: usize },
}

impl WeekdayBound {
    pub fn max(self) -> usize {
        match self {
            WeekdayBound::Fixed { max } | WeekdayBound::PerWeek { max } => max,
        }
    }

    /// Effective K given the current per-week field value.
    pub fn limit(self, per_week: Option<usize>) -> usize {
        match self {
            WeekdayBound::Fixed { max } => max,
            WeekdayBound::PerWeek { max } => per_week
                .filter(|n| (1..=max).contains(n))
                .unwrap_or(max),
        }
    }

    pub fn uses_per_week_field(self) -> bool {
        matches!(self, WeekdayBound::PerWeek { .. })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub min_range_days: i64,
    pub weekday_bound: WeekdayBound,
    pub create_default: DefaultState,
    pub edit_default: DefaultState,
    pub session_boundary: SessionBoundary,
    pub lock_last_active: bool,
    pub submit_mode: SubmitMode,
}

impl Default for EditorSettings {
    fn default() -> Self {
        EditorSettings {
            min_range_days: 14,
            weekday_bound: WeekdayBound::Fixed { max: 3 },
            create_default: DefaultState::Active,
            edit_default: DefaultState::Active,
            session_boundary: SessionBoundary::OnLeave,
            lock_last_active: false,
            submit_mode: SubmitMode::ShortCircuit,
        }
    }
}

impl EditorSettings {
    fn check(&self) -> Result<()> {
        let max = self.weekday_bound.max();
        if max == 0 || max > 7 {
            anyhow::bail!("editor.weekday_bound.max must be between 1 and 7, got {max}");
        }
        if !(0..=MAX_RANGE_DAYS).contains(&self.min_range_days) {
            anyhow::bail!(
                "editor.min_range_days must be between 0 and {MAX_RANGE_DAYS}, got {}",
                self.min_range_days
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.bind, "0.0.0.0:3000");
        assert_eq!(config.editor.min_range_days, 14);
        assert_eq!(config.editor.weekday_bound, WeekdayBound::Fixed { max: 3 });
        assert_eq!(config.editor.session_boundary, SessionBoundary::OnLeave);
    }

    #[test]
    fn test_full_editor_section() {
        let raw = r#"
            timezone = "Europe/Prague"

            [editor]
            min_range_days = 21
            weekday_bound = { kind = "per_week", max = 2 }
            create_default = "active"
            edit_default = "inactive"
            session_boundary = "on_load"
            lock_last_active = true
            submit_mode = "run_all"
        "#;
        let config = AppConfig::from_toml(raw).unwrap();
        assert_eq!(config.timezone, "Europe/Prague");
        assert_eq!(config.editor.min_range_days, 21);
        assert_eq!(config.editor.weekday_bound, WeekdayBound::PerWeek { max: 2 });
        assert_eq!(config.editor.edit_default, DefaultState::Inactive);
        assert_eq!(config.editor.session_boundary, SessionBoundary::OnLoad);
        assert!(config.editor.lock_last_active);
        assert_eq!(config.editor.submit_mode, SubmitMode::RunAll);
    }

    #[test]
    fn test_rejects_out_of_range_bound() {
        let raw = "[editor]\nweekday_bound = { kind = \"fixed\", max = 8 }\n";
        assert!(AppConfig::from_toml(raw).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_minimum() {
        assert!(AppConfig::from_toml("[editor]\nmin_range_days = -1\n").is_err());
        let raw = format!("[editor]\nmin_range_days = {}\n", i64::MAX);
        assert!(AppConfig::from_toml(&raw).is_err());
        assert!(AppConfig::from_toml("[editor]\nmin_range_days = 365\n").is_ok());
    }

    #[test]
    fn test_per_week_limit() {
        let bound = WeekdayBound::PerWeek { max: 3 };
        assert_eq!(bound.limit(None), 3);
        assert_eq!(bound.limit(Some(2)), 2);
        assert_eq!(bound.limit(Some(5)), 3);
        assert_eq!(bound.limit(Some(0)), 3);
        assert_eq!(WeekdayBound::Fixed { max: 3 }.limit(Some(1)), 3);
    }
}
