//! Configuration module - persisted settings and compile-time defaults
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values (timings, geometry, target identity)
//! - `types` - The persisted `Settings` struct
//! - `loader` - File system loading, saving and legacy migration

pub mod defaults;
mod loader;
mod types;

pub use loader::{
    legacy_settings_path, load_settings, load_settings_or_default, migrate_legacy_settings,
    save_settings, settings_path,
};
pub use types::{clamp_app_scale, Settings};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
