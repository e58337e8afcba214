//! Hotkey Registration Reconciler
//!
//! Every pass tears down all live hooks and reinstalls from scratch, so a
//! changed binding can never leave a stale or duplicate hook behind. The
//! registrar is the only owner of the backend; `&mut self` keeps passes
//! single-flight.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::bridge::InputHookBridge;
use super::resolve;
use crate::bindings::HotkeyBindings;
use crate::chord::Chord;
use crate::error::HookError;

/// Why a binding was not installed this pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationSkip {
    UnresolvedTarget,
    EmptyChord,
    /// Feature targets wait for `hotkeys_active`
    GatedOff,
    /// An earlier binding in map order already claimed this chord
    DuplicateChord { claimed_by: String },
    /// Delivered by the pointer channel instead
    PointerChord,
    InstallFailed(HookError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub installed: Vec<(String, Chord)>,
    pub skipped: Vec<(String, RegistrationSkip)>,
    /// Nothing was installed because a capture session is running
    pub suspended: bool,
}

impl ReconcileReport {
    pub fn skip_reason(&self, id: &str) -> Option<&RegistrationSkip> {
        self.skipped
            .iter()
            .find(|(skipped, _)| skipped == id)
            .map(|(_, reason)| reason)
    }
}

pub struct HotkeyRegistrar<H> {
    bridge: H,
    passes: u64,
}

impl<H: InputHookBridge> HotkeyRegistrar<H> {
    pub fn new(bridge: H) -> Self {
        Self { bridge, passes: 0 }
    }

    pub fn bridge(&self) -> &H {
        &self.bridge
    }

    /// Number of reconciliation passes run so far
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Remove every live hook without reinstalling.
    pub fn teardown(&mut self) {
        if let Err(e) = self.bridge.unregister_all() {
            warn!(category = "HOTKEY", error = %e, "Hook teardown failed");
        }
    }

    /// Recompute live hooks from `bindings` and the current gating.
    pub fn reconcile(
        &mut self,
        bindings: &HotkeyBindings,
        capture_active: bool,
        hotkeys_active: bool,
    ) -> ReconcileReport {
        self.passes += 1;
        self.teardown();

        let mut report = ReconcileReport::default();
        if capture_active {
            debug!(category = "HOTKEY", "Capture active, hooks suspended");
            report.suspended = true;
            return report;
        }

        let mut claimed: HashMap<&Chord, &str> = HashMap::new();
        for (id, chord) in bindings.iter() {
            let Some(target) = resolve(id) else {
                report
                    .skipped
                    .push((id.to_string(), RegistrationSkip::UnresolvedTarget));
                continue;
            };
            if chord.is_empty() {
                report
                    .skipped
                    .push((id.to_string(), RegistrationSkip::EmptyChord));
                continue;
            }
            // Gated-off features do not claim their chord
            if target.is_feature() && !hotkeys_active {
                report
                    .skipped
                    .push((id.to_string(), RegistrationSkip::GatedOff));
                continue;
            }
            if let Some(first) = claimed.get(chord) {
                warn!(
                    category = "HOTKEY",
                    chord = %chord,
                    target_id = id,
                    claimed_by = *first,
                    "Duplicate chord skipped"
                );
                report.skipped.push((
                    id.to_string(),
                    RegistrationSkip::DuplicateChord {
                        claimed_by: first.to_string(),
                    },
                ));
                continue;
            }
            claimed.insert(chord, id);
            if chord.is_pointer() {
                report
                    .skipped
                    .push((id.to_string(), RegistrationSkip::PointerChord));
                continue;
            }
            match self.bridge.register(chord, id) {
                Ok(()) => report.installed.push((id.to_string(), chord.clone())),
                Err(e) => {
                    warn!(
                        category = "HOTKEY",
                        chord = %chord,
                        target_id = id,
                        error = %e,
                        "Failed to install hook"
                    );
                    report
                        .skipped
                        .push((id.to_string(), RegistrationSkip::InstallFailed(e)));
                }
            }
        }

        info!(
            category = "HOTKEY",
            installed = report.installed.len(),
            skipped = report.skipped.len(),
            "Hotkeys reconciled"
        );
        report
    }
}
