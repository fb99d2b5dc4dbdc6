//! Durable user preferences.
//!
//! The only persisted state in the whole subsystem: one JSON object in a
//! dotfile under `$HOME`, holding the theme flag as the literal strings
//! `"true"`/`"false"`. IO failures are logged and degrade to defaults.

use std::collections::HashMap;
use std::path::PathBuf;

/// Fixed key for the theme flag.
pub const DARK_MODE_KEY: &str = "darkMode";

/// Preference store backed by a single JSON file.
pub struct Prefs {
    path: PathBuf,
}

impl Prefs {
    /// Store at the default location (`~/.streamsync/prefs.json`).
    /// None when no home directory is available.
    pub fn open_default() -> Option<Self> {
        let home = std::env::var("HOME").ok()?;
        Some(Prefs {
            path: PathBuf::from(home).join(".streamsync").join("prefs.json"),
        })
    }

    /// Store at an explicit path.
    pub fn at(path: PathBuf) -> Self {
        Prefs { path }
    }

    /// Stored theme flag, or None when never written (or unreadable).
    pub fn dark_mode(&self) -> Option<bool> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let entries: HashMap<String, String> = serde_json::from_str(&content).ok()?;
        match entries.get(DARK_MODE_KEY).map(String::as_str) {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        }
    }

    /// Persist the theme flag. Best effort: failures are logged only.
    pub fn set_dark_mode(&self, dark: bool) {
        let mut entries: HashMap<String, String> = std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        entries.insert(
            DARK_MODE_KEY.to_string(),
            if dark { "true" } else { "false" }.to_string(),
        );

        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string(&entries) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    log::warn!("Failed to persist preferences to {:?}: {}", self.path, e);
                }
            }
            Err(e) => log::warn!("Failed to serialize preferences: {}", e),
        }
    }
}

/// Platform color-scheme preference, used when nothing is stored yet.
///
/// Headless hosts have no media query to ask, so this honors the
/// `STREAMSYNC_COLOR_SCHEME` environment variable and otherwise defaults to
/// light.
pub fn system_prefers_dark() -> bool {
    matches!(
        std::env::var("STREAMSYNC_COLOR_SCHEME").as_deref(),
        Ok("dark")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_unset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefs = Prefs::at(dir.path().join("prefs.json"));
        assert_eq!(prefs.dark_mode(), None);
    }

    #[test]
    fn round_trips_both_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefs = Prefs::at(dir.path().join("prefs.json"));

        prefs.set_dark_mode(true);
        assert_eq!(prefs.dark_mode(), Some(true));

        prefs.set_dark_mode(false);
        assert_eq!(prefs.dark_mode(), Some(false));
    }

    #[test]
    fn values_are_stored_as_literal_strings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prefs.json");
        let prefs = Prefs::at(path.clone());

        prefs.set_dark_mode(true);

        let content = std::fs::read_to_string(&path).expect("prefs file");
        assert!(content.contains("\"darkMode\""));
        assert!(content.contains("\"true\""));
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefs = Prefs::at(dir.path().join("nested").join("prefs.json"));

        prefs.set_dark_mode(true);

        assert_eq!(prefs.dark_mode(), Some(true));
    }

    #[test]
    fn garbage_content_reads_as_unset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json at all").expect("write");

        let prefs = Prefs::at(path);
        assert_eq!(prefs.dark_mode(), None);
    }
}
