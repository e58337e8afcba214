//! Default configuration values
//!
//! All constants used throughout the controller are defined here.

use std::time::Duration;

/// Target process identity
pub const TARGET_EXE: &str = "Sky.exe";
pub const TARGET_WINDOW_CLASS: &str = "TgcMainWindow";

/// Settings file location
pub const APP_DIR_NAME: &str = "modext";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const LEGACY_APP_DIR_NAME: &str = "com.xetrinityz.thatskymodext";

/// Appearance defaults
pub const DEFAULT_THEME: &str = "aqua";
pub const THEMES: &[&str] = &["aqua", "ember", "aurora", "noir", "sunrise", "glacier"];

/// App scale bounds
pub const DEFAULT_APP_SCALE: f32 = 1.0;
pub const MIN_APP_SCALE: f32 = 0.8;
pub const MAX_APP_SCALE: f32 = 1.4;

/// Window geometry (logical pixels, before scale)
pub const DEFAULT_WINDOW_WIDTH: u32 = 1000;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 760;
pub const COLLAPSED_WIDTH: u32 = 520;
pub const COLLAPSED_HEIGHT: u32 = 56;
pub const MIN_EXPANDED_WIDTH: u32 = 400;
pub const MIN_EXPANDED_HEIGHT: u32 = 300;

/// Presence animation
pub const COLLAPSE_DURATION: Duration = Duration::from_millis(220);
pub const EXPAND_DURATION: Duration = Duration::from_millis(260);
pub const MIN_ANIMATION_STEPS: u32 = 6;
pub const ANIMATION_STEP_MS: u64 = 40;
pub const MIN_ANIMATION_DELAY: Duration = Duration::from_millis(10);

/// Timing contracts
pub const GATE_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const HOTKEY_REFRACTORY: Duration = Duration::from_millis(250);
pub const SCALE_RESIZE_DEBOUNCE: Duration = Duration::from_millis(120);
pub const TOAST_LIFETIME: Duration = Duration::from_secs(4);

/// Super Run
pub const DEFAULT_RUN_SPEED: f32 = 3.5;
pub const DEFAULT_SUPER_RUN_SPEED: f32 = 20.0;
