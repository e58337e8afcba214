//! Hotkey Capture Controller
//!
//! `Idle -> Listening(target) -> Idle`. While listening, the next qualifying
//! key or pointer press is recorded as the target's chord. At most one session
//! exists; starting another replaces the pending target.
//!
//! The host window is forced activating for the duration of a session so it
//! can receive key presses. The value to restore is captured once, when the
//! first session starts, and handed back when the session ends.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bindings::HotkeyBindings;
use crate::chord::{Chord, HeldModifiers, PointerButton};

/// A key press delivered to the capture session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPress {
    pub key: String,
    #[serde(default)]
    pub modifiers: HeldModifiers,
}

impl KeyPress {
    pub fn new(key: impl Into<String>, modifiers: HeldModifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Listening {
        target_id: String,
    },
}

/// What the caller must do after `begin`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeginEffects {
    /// Switch the window to activating mode for the session
    pub clear_non_activating: bool,
    /// Target of a session this one replaced
    pub replaced: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureResult {
    Cancelled,
    Cleared,
    Bound(Chord),
}

/// A finished session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEnd {
    pub target_id: String,
    pub result: CaptureResult,
    /// Non-activating mode to put back, if it was captured at session start
    pub restore_non_activating: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    NotListening,
    /// Input did not end the session (bare modifier, unqualified button)
    Pending,
    Finished(CaptureEnd),
}

#[derive(Debug, Default)]
pub struct CaptureController {
    state: CaptureState,
    restore_non_activating: Option<bool>,
}

impl CaptureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, CaptureState::Listening { .. })
    }

    pub fn target(&self) -> Option<&str> {
        match &self.state {
            CaptureState::Listening { target_id } => Some(target_id),
            CaptureState::Idle => None,
        }
    }

    /// Start (or retarget) a session.
    pub fn begin(&mut self, target_id: impl Into<String>, non_activating: bool) -> BeginEffects {
        let target_id = target_id.into();
        if self.restore_non_activating.is_none() {
            self.restore_non_activating = Some(non_activating);
        }
        let replaced = match std::mem::take(&mut self.state) {
            CaptureState::Listening { target_id } => Some(target_id),
            CaptureState::Idle => None,
        };
        info!(
            category = "CAPTURE",
            target_id = %target_id,
            replaced = ?replaced,
            "Listening for hotkey"
        );
        self.state = CaptureState::Listening { target_id };
        BeginEffects {
            clear_non_activating: non_activating,
            replaced,
        }
    }

    /// Abort without touching bindings.
    pub fn cancel(&mut self) -> CaptureOutcome {
        self.finish(CaptureResult::Cancelled)
    }

    pub fn handle_key(
        &mut self,
        press: &KeyPress,
        bindings: &mut HotkeyBindings,
    ) -> CaptureOutcome {
        let Some(target_id) = self.target().map(str::to_string) else {
            return CaptureOutcome::NotListening;
        };

        match press.key.as_str() {
            "Escape" => self.finish(CaptureResult::Cancelled),
            "Backspace" | "Delete" => {
                bindings.remove(&target_id);
                self.finish(CaptureResult::Cleared)
            }
            key => match Chord::compose(press.modifiers, key) {
                Some(chord) => {
                    bindings.set(target_id, chord.clone());
                    self.finish(CaptureResult::Bound(chord))
                }
                None => {
                    debug!(category = "CAPTURE", key = key, "Bare modifier, still listening");
                    CaptureOutcome::Pending
                }
            },
        }
    }

    pub fn handle_pointer(
        &mut self,
        button: PointerButton,
        bindings: &mut HotkeyBindings,
    ) -> CaptureOutcome {
        let Some(target_id) = self.target().map(str::to_string) else {
            return CaptureOutcome::NotListening;
        };
        match Chord::pointer(button) {
            Some(chord) => {
                bindings.set(target_id, chord.clone());
                self.finish(CaptureResult::Bound(chord))
            }
            None => CaptureOutcome::Pending,
        }
    }

    fn finish(&mut self, result: CaptureResult) -> CaptureOutcome {
        let CaptureState::Listening { target_id } = std::mem::take(&mut self.state) else {
            return CaptureOutcome::NotListening;
        };
        info!(
            category = "CAPTURE",
            target_id = %target_id,
            result = ?result,
            "Capture finished"
        );
        CaptureOutcome::Finished(CaptureEnd {
            target_id,
            result,
            restore_non_activating: self.restore_non_activating.take(),
        })
    }
}
