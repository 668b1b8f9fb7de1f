//! User preference persistence.
//!
//! Settings are stored as one JSON object and merged over hard defaults on
//! load: every field carries its own `#[serde(default)]` rule, so objects
//! written by older builds still produce a complete settings struct. Saves are
//! synchronous and happen on every change.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const SETTINGS_FILE: &str = "settings.json";

pub const DEFAULT_REWRITE_MAX_WORDS: u32 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Visual style requested for DOCX export. The backend currently renders one
/// layout; the preference is carried in the settings object regardless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStyle {
    #[default]
    Modern,
    Classic,
}

impl ExportStyle {
    pub fn toggle(self) -> Self {
        match self {
            ExportStyle::Modern => ExportStyle::Classic,
            ExportStyle::Classic => ExportStyle::Modern,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStyle::Modern => "modern",
            ExportStyle::Classic => "classic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Word budget handed to the rewrite endpoint.
    #[serde(default = "default_rewrite_max_words")]
    pub rewrite_max_words: u32,
    #[serde(default)]
    pub export_style: ExportStyle,
    /// When off, successful analyses are not captured into history.
    #[serde(default = "default_true")]
    pub auto_save_history: bool,
    /// Shows recency/hygiene percentages and the normalized JD projection.
    #[serde(default)]
    pub show_advanced_analysis: bool,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_rewrite_max_words() -> u32 {
    DEFAULT_REWRITE_MAX_WORDS
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            rewrite_max_words: DEFAULT_REWRITE_MAX_WORDS,
            export_style: ExportStyle::default(),
            auto_save_history: true,
            show_advanced_analysis: false,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

/// Disk-backed settings store. Corrupt or missing files fall back to defaults
/// and are logged, never surfaced to the user.
#[derive(Clone, Debug)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SETTINGS_FILE),
        }
    }

    pub fn load(&self) -> UserSettings {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(_) => return UserSettings::default(),
        };
        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("[settings] corrupt {}: {e}; using defaults", self.path.display());
                UserSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &UserSettings) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("[settings] cannot create {}: {e}", parent.display());
                return;
            }
        }
        match serde_json::to_string_pretty(settings) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    log::warn!("[settings] write failed {}: {e}", self.path.display());
                }
            }
            Err(e) => log::warn!("[settings] serialize failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let s = UserSettings::default();
        assert_eq!(s.rewrite_max_words, DEFAULT_REWRITE_MAX_WORDS);
        assert_eq!(s.export_style, ExportStyle::Modern);
        assert!(s.auto_save_history);
        assert!(!s.show_advanced_analysis);
        assert_eq!(s.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
    }

    #[test]
    fn partial_object_merges_over_defaults() {
        // An object written before newer fields existed.
        let stored = r#"{"rewrite_max_words": 22, "auto_save_history": false}"#;
        let s: UserSettings = serde_json::from_str(stored).unwrap();
        assert_eq!(s.rewrite_max_words, 22);
        assert!(!s.auto_save_history);
        // Missing fields take their per-field defaults.
        assert_eq!(s.export_style, ExportStyle::Modern);
        assert_eq!(s.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
    }

    #[test]
    fn export_style_round_trips_lowercase() {
        assert_eq!(
            serde_json::to_string(&ExportStyle::Classic).unwrap(),
            "\"classic\""
        );
        let s: ExportStyle = serde_json::from_str("\"modern\"").unwrap();
        assert_eq!(s, ExportStyle::Modern);
    }
}
