//! Configuration type definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Persisted user settings.
///
/// Every field is defaulted so partial or older files still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: String,
    pub always_on_top: bool,
    pub reduce_motion: bool,
    /// Host window never takes focus when clicked
    pub non_activate_window: bool,
    pub app_scale: f32,
    pub memory_saver: bool,
    /// Target id -> chord, in insertion order
    pub feature_hotkeys: IndexMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            always_on_top: false,
            reduce_motion: false,
            non_activate_window: false,
            app_scale: DEFAULT_APP_SCALE,
            memory_saver: false,
            feature_hotkeys: IndexMap::new(),
        }
    }
}

impl Settings {
    /// Clamp out-of-range values read from disk.
    pub fn sanitized(mut self) -> Self {
        if !THEMES.contains(&self.theme.as_str()) {
            self.theme = DEFAULT_THEME.to_string();
        }
        self.app_scale = clamp_app_scale(self.app_scale);
        self
    }
}

/// Clamp an app scale into the supported range; non-finite values reset to 1.0.
pub fn clamp_app_scale(value: f32) -> f32 {
    if !value.is_finite() {
        return DEFAULT_APP_SCALE;
    }
    value.clamp(MIN_APP_SCALE, MAX_APP_SCALE)
}
