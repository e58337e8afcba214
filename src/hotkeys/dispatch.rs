//! Trigger dispatch
//!
//! Hook presses and pointer chords both end up here. Both resolve the target,
//! check gating (features need `hotkeys_active`, actions need
//! `focus_active`) and enforce a per-id refractory window so key repeat and
//! duplicate delivery fire once. A hook press claims the refractory window
//! before the gate is checked, so a gated-off press still suppresses a repeat
//! right after focus returns. A pointer chord is gated first and only an
//! accepted one claims the window.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::{resolve, HotkeyTarget, UiAction};
use crate::bindings::HotkeyBindings;
use crate::chord::Chord;
use crate::config::defaults::HOTKEY_REFRACTORY;
use crate::features::Feature;
use crate::gate::GateState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Hook,
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    UnknownTarget,
    CaptureActive,
    UnboundChord,
    GatedOff,
    Refractory,
}

/// What the controller should do for a trigger
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatch {
    /// Flip the feature relative to its current belief
    ToggleFeature(&'static Feature),
    RunAction(UiAction),
    Ignored(IgnoreReason),
}

#[derive(Debug)]
pub struct Dispatcher {
    last_fired: HashMap<String, Instant>,
    refractory: Duration,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_refractory(HOTKEY_REFRACTORY)
    }

    pub fn with_refractory(refractory: Duration) -> Self {
        Self {
            last_fired: HashMap::new(),
            refractory,
        }
    }

    /// A live hook reported `target_id`.
    pub fn on_hook(&mut self, target_id: &str, gate: &GateState, now: Instant) -> Dispatch {
        self.dispatch(TriggerSource::Hook, target_id, gate, now)
    }

    /// The pointer channel delivered `chord`.
    pub fn on_pointer(
        &mut self,
        chord: &Chord,
        bindings: &HotkeyBindings,
        capture_active: bool,
        gate: &GateState,
        now: Instant,
    ) -> Dispatch {
        if capture_active {
            return Dispatch::Ignored(IgnoreReason::CaptureActive);
        }
        let Some(target_id) = bindings.find_by_chord(chord) else {
            return Dispatch::Ignored(IgnoreReason::UnboundChord);
        };
        self.dispatch(TriggerSource::Pointer, target_id, gate, now)
    }

    fn dispatch(
        &mut self,
        source: TriggerSource,
        target_id: &str,
        gate: &GateState,
        now: Instant,
    ) -> Dispatch {
        let Some(target) = resolve(target_id) else {
            return Dispatch::Ignored(IgnoreReason::UnknownTarget);
        };

        let allowed = match target {
            HotkeyTarget::Feature(_) => gate.hotkeys_active(),
            HotkeyTarget::Action(_) => gate.focus_active(),
        };
        let gate_first = source == TriggerSource::Pointer;
        if gate_first && !allowed {
            debug!(category = "HOTKEY", target_id, ?source, "Trigger gated off");
            return Dispatch::Ignored(IgnoreReason::GatedOff);
        }

        if let Some(last) = self.last_fired.get(target_id) {
            if now.saturating_duration_since(*last) < self.refractory {
                debug!(category = "HOTKEY", target_id, ?source, "Trigger within refractory window");
                return Dispatch::Ignored(IgnoreReason::Refractory);
            }
        }
        self.last_fired.insert(target_id.to_string(), now);

        if !allowed {
            debug!(category = "HOTKEY", target_id, ?source, "Trigger gated off");
            return Dispatch::Ignored(IgnoreReason::GatedOff);
        }

        debug!(category = "HOTKEY", target_id, ?source, "Trigger dispatched");
        match target {
            HotkeyTarget::Feature(feature) => Dispatch::ToggleFeature(feature),
            HotkeyTarget::Action(action) => Dispatch::RunAction(action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_gate() -> GateState {
        GateState {
            attached: true,
            host_focused: true,
            game_focused: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refractory_window_per_id() {
        let mut dispatcher = Dispatcher::new();
        let gate = active_gate();

        let first = dispatcher.on_hook("godmode", &gate, Instant::now());
        assert!(matches!(first, Dispatch::ToggleFeature(f) if f.id == "godmode"));

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(
            dispatcher.on_hook("godmode", &gate, Instant::now()),
            Dispatch::Ignored(IgnoreReason::Refractory)
        );
        // Another id is unaffected
        assert!(matches!(
            dispatcher.on_hook("anti-afk", &gate, Instant::now()),
            Dispatch::ToggleFeature(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_triggers_300ms_apart_both_dispatch() {
        let mut dispatcher = Dispatcher::new();
        let gate = active_gate();

        assert!(matches!(
            dispatcher.on_hook("godmode", &gate, Instant::now()),
            Dispatch::ToggleFeature(_)
        ));
        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(matches!(
            dispatcher.on_hook("godmode", &gate, Instant::now()),
            Dispatch::ToggleFeature(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ignored_trigger_does_not_extend_window() {
        let mut dispatcher = Dispatcher::new();
        let gate = active_gate();

        dispatcher.on_hook("godmode", &gate, Instant::now());
        tokio::time::advance(Duration::from_millis(200)).await;
        dispatcher.on_hook("godmode", &gate, Instant::now());
        tokio::time::advance(Duration::from_millis(100)).await;
        // 300ms after the accepted trigger
        assert!(matches!(
            dispatcher.on_hook("godmode", &gate, Instant::now()),
            Dispatch::ToggleFeature(_)
        ));
    }

    #[test]
    fn test_actions_need_focus_features_need_attachment() {
        let mut dispatcher = Dispatcher::new();
        let now = Instant::now();

        let focused_detached = GateState {
            attached: false,
            host_focused: true,
            game_focused: false,
        };
        assert_eq!(
            dispatcher.on_hook("godmode", &focused_detached, now),
            Dispatch::Ignored(IgnoreReason::GatedOff)
        );
        assert_eq!(
            dispatcher.on_hook("toggle-collapse", &focused_detached, now),
            Dispatch::RunAction(UiAction::ToggleCollapse)
        );

        let unfocused = GateState {
            attached: true,
            host_focused: false,
            game_focused: false,
        };
        let mut dispatcher = Dispatcher::new();
        assert_eq!(
            dispatcher.on_hook("toggle-collapse", &unfocused, now),
            Dispatch::Ignored(IgnoreReason::GatedOff)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_gated_hook_press_claims_refractory_window() {
        let mut dispatcher = Dispatcher::new();
        let unfocused = GateState {
            attached: true,
            host_focused: false,
            game_focused: false,
        };
        assert_eq!(
            dispatcher.on_hook("toggle-collapse", &unfocused, Instant::now()),
            Dispatch::Ignored(IgnoreReason::GatedOff)
        );

        // Focus returns 100ms later: the repeat is still suppressed
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(
            dispatcher.on_hook("toggle-collapse", &active_gate(), Instant::now()),
            Dispatch::Ignored(IgnoreReason::Refractory)
        );

        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(
            dispatcher.on_hook("toggle-collapse", &active_gate(), Instant::now()),
            Dispatch::RunAction(UiAction::ToggleCollapse)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_gated_pointer_chord_leaves_window_open() {
        let mut dispatcher = Dispatcher::new();
        let mut bindings = HotkeyBindings::new();
        bindings.set("toggle-collapse", Chord::new("Mouse4"));
        let unfocused = GateState {
            attached: true,
            host_focused: false,
            game_focused: false,
        };
        let chord = Chord::new("Mouse4");

        assert_eq!(
            dispatcher.on_pointer(&chord, &bindings, false, &unfocused, Instant::now()),
            Dispatch::Ignored(IgnoreReason::GatedOff)
        );
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(
            dispatcher.on_pointer(&chord, &bindings, false, &active_gate(), Instant::now()),
            Dispatch::RunAction(UiAction::ToggleCollapse)
        );
    }

    #[test]
    fn test_pointer_channel() {
        let mut dispatcher = Dispatcher::new();
        let gate = active_gate();
        let now = Instant::now();
        let mut bindings = HotkeyBindings::new();
        bindings.set("anti-afk", Chord::new("Mouse5"));

        assert_eq!(
            dispatcher.on_pointer(&Chord::new("Mouse5"), &bindings, true, &gate, now),
            Dispatch::Ignored(IgnoreReason::CaptureActive)
        );
        assert_eq!(
            dispatcher.on_pointer(&Chord::new("Mouse3"), &bindings, false, &gate, now),
            Dispatch::Ignored(IgnoreReason::UnboundChord)
        );
        assert!(matches!(
            dispatcher.on_pointer(&Chord::new("Mouse5"), &bindings, false, &gate, now),
            Dispatch::ToggleFeature(f) if f.id == "anti-afk"
        ));
        assert_eq!(
            dispatcher.on_pointer(&Chord::new("Mouse5"), &bindings, false, &gate, now),
            Dispatch::Ignored(IgnoreReason::Refractory)
        );
    }

    #[test]
    fn test_unknown_target() {
        let mut dispatcher = Dispatcher::new();
        assert_eq!(
            dispatcher.on_hook("retired", &active_gate(), Instant::now()),
            Dispatch::Ignored(IgnoreReason::UnknownTarget)
        );
    }
}
