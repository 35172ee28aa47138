// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Settings file serialization.
//!
//! Settings are stored as YAML. The file is looked up in the path named by
//! `SMART_EYE_CONFIG`, falling back to `smart_eye.yaml` in the working
//! directory.

use crate::models::settings::Settings;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV: &str = "SMART_EYE_CONFIG";
pub const CONFIG_FILE: &str = "smart_eye.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Where settings are read from.
pub fn settings_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

/// Read settings from a YAML file.
pub fn import_settings(path: &Path) -> Result<Settings, ConfigError> {
    let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_yaml::from_str(&yaml).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Settings for this run. A missing file means defaults; an unreadable or
/// malformed one is logged and also falls back to defaults.
pub fn load_settings(path: &Path) -> Settings {
    if !path.exists() {
        log::debug!("No settings file at {}, using defaults", path.display());
        return Settings::default();
    }
    match import_settings(path) {
        Ok(settings) => {
            log::info!("Loaded settings from {}", path.display());
            settings
        }
        Err(e) => {
            log::warn!("{e}; using default settings");
            Settings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join(CONFIG_FILE));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "data_root: /srv/clinic\nzoom_max: 6.0\n").unwrap();

        let settings = import_settings(&path).unwrap();
        assert_eq!(settings.data_root, PathBuf::from("/srv/clinic"));
        assert_eq!(settings.zoom_max, Some(6.0));
        assert_eq!(settings.zoom_min, None);
        assert_eq!(settings.draw_width, 3.0);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "draw_width: [not, a, number]\n").unwrap();

        assert!(matches!(import_settings(&path), Err(ConfigError::Parse { .. })));
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn test_settings_survive_yaml() {
        let settings = Settings {
            zoom_min: Some(0.25),
            teams_url: "https://example.org/meet".to_string(),
            ..Settings::default()
        };
        let yaml = serde_yaml::to_string(&settings).unwrap();
        let parsed: Settings = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, settings);
    }
}
