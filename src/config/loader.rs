//! Settings loading and saving
//!
//! Settings live in `<config_dir>/modext/settings.json`. A settings file left by
//! the previous app identifier is copied over once when no current file exists.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use super::defaults::{APP_DIR_NAME, LEGACY_APP_DIR_NAME, SETTINGS_FILE_NAME};
use super::types::Settings;
use crate::error::ConfigError;

/// Default settings path under the platform config directory.
pub fn settings_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME))
}

/// Where the previous app identifier kept its settings.
pub fn legacy_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(LEGACY_APP_DIR_NAME).join(SETTINGS_FILE_NAME))
}

/// Copy a legacy settings file into place if the target does not exist yet.
///
/// Best effort: every failure is logged and ignored. Returns true when a copy happened.
pub fn migrate_legacy_settings(target: &Path, legacy: &Path) -> bool {
    if target.exists() || !legacy.exists() {
        return false;
    }
    if let Some(parent) = target.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!(category = "CONFIG", error = %e, "Failed to create settings directory");
            return false;
        }
    }
    match fs::copy(legacy, target) {
        Ok(_) => {
            info!(
                category = "CONFIG",
                from = %legacy.display(),
                to = %target.display(),
                "Migrated legacy settings"
            );
            true
        }
        Err(e) => {
            warn!(category = "CONFIG", error = %e, "Failed to migrate legacy settings");
            false
        }
    }
}

/// Load settings from `path`.
///
/// A missing file yields defaults. Read and parse failures are returned so the
/// caller can decide to substitute defaults.
#[instrument(name = "load_settings", skip_all, fields(path = %path.display()))]
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        info!(category = "CONFIG", "Settings file not found, using defaults");
        return Ok(Settings::default());
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let settings: Settings = serde_json::from_str(&contents)?;
    Ok(settings.sanitized())
}

/// Load settings, substituting defaults on any failure.
pub fn load_settings_or_default(path: &Path) -> Settings {
    match load_settings(path) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(category = "CONFIG", error = %e, "Failed to load settings, using defaults");
            Settings::default()
        }
    }
}

/// Save settings as pretty JSON, creating parent directories.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.display().to_string(),
            source,
        })?;
    }
    let payload = serde_json::to_string_pretty(settings)?;
    fs::write(path, payload).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })
}
