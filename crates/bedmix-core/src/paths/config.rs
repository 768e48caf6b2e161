//! Settings file persistence.
//!
//! Settings live in `config.json` under the data root. A missing or
//! unreadable file yields defaults rather than an error so a fresh install
//! always starts.

use std::fs;
use std::path::Path;

use tracing::warn;

use super::error::PathError;
use crate::settings::MixerSettings;

/// Load settings from `path`, falling back to defaults.
pub fn load_settings(path: &Path) -> MixerSettings {
    let Ok(raw) = fs::read_to_string(path) else {
        return MixerSettings::with_defaults();
    };

    match serde_json::from_str::<MixerSettings>(&raw) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not parse config, using defaults");
            MixerSettings::with_defaults()
        }
    }
}

/// Persist settings to `path` as pretty-printed JSON.
pub fn save_settings(path: &Path, settings: &MixerSettings) -> Result<(), PathError> {
    let to_err = |reason: String| PathError::ConfigFileError {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| to_err(e.to_string()))?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(|e| to_err(e.to_string()))?;
    fs::write(path, json).map_err(|e| to_err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = load_settings(&temp.path().join("config.json"));
        assert_eq!(settings, MixerSettings::with_defaults());
    }

    #[test]
    fn test_garbage_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(load_settings(&path), MixerSettings::with_defaults());
    }

    #[test]
    fn test_saved_settings_are_reloaded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.json");
        let mut settings = MixerSettings::with_defaults();
        settings.prune_age_days = Some(3);
        settings.default_music_playlist = Some("PLmusic".to_string());

        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path), settings);
    }
}
