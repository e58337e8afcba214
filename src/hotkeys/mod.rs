//! Global hotkeys
//!
//! # Module Structure
//!
//! - `bridge` - The input hook backend trait and an in-process recording backend
//! - `registration` - Turns the binding map plus gating into live hooks
//! - `dispatch` - Gating and refractory rules shared by hooks and pointer chords
//! - `native` - OS-level backend on `global-hotkey` (feature `native-hotkeys`)
//!
//! A binding's target id names either a catalog feature or a UI action.

mod bridge;
mod dispatch;
#[cfg(feature = "native-hotkeys")]
mod native;
mod registration;

pub use bridge::{InputHookBridge, RecordingHookBridge};
pub use dispatch::{Dispatch, Dispatcher, IgnoreReason, TriggerSource};
#[cfg(feature = "native-hotkeys")]
pub use native::GlobalHotkeyBridge;
pub use registration::{HotkeyRegistrar, ReconcileReport, RegistrationSkip};

use crate::features::{self, Feature};

/// Actions that are not features but can still be bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiAction {
    ToggleCollapse,
}

impl UiAction {
    pub const ALL: [UiAction; 1] = [UiAction::ToggleCollapse];

    pub fn id(&self) -> &'static str {
        match self {
            UiAction::ToggleCollapse => "toggle-collapse",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.id() == id)
    }
}

/// What a binding points at
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HotkeyTarget {
    Feature(&'static Feature),
    Action(UiAction),
}

impl HotkeyTarget {
    pub fn is_feature(&self) -> bool {
        matches!(self, HotkeyTarget::Feature(_))
    }
}

/// Resolve a binding id against the catalog and the action table.
pub fn resolve(id: &str) -> Option<HotkeyTarget> {
    features::find(id)
        .map(HotkeyTarget::Feature)
        .or_else(|| UiAction::from_id(id).map(HotkeyTarget::Action))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        assert!(matches!(resolve("godmode"), Some(HotkeyTarget::Feature(f)) if f.id == "godmode"));
        assert_eq!(
            resolve("toggle-collapse"),
            Some(HotkeyTarget::Action(UiAction::ToggleCollapse))
        );
        assert_eq!(resolve("no-such-thing"), None);
    }
}
