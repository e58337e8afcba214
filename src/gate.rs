//! Activity Gate
//!
//! Polled focus and attachment facts, and the two booleans derived from them:
//! `focus_active` (either window has focus) and `hotkeys_active` (attached and
//! focused). Polling accepts up to one interval of staleness.

use serde::Serialize;
use tracing::debug;

use crate::config::defaults::TARGET_WINDOW_CLASS;
use crate::target::ProcessSession;
use crate::window::HostWindow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateState {
    pub attached: bool,
    pub host_focused: bool,
    /// Foreground window belongs to the target; only ever true while attached
    pub game_focused: bool,
}

impl GateState {
    pub fn focus_active(&self) -> bool {
        self.host_focused || self.game_focused
    }

    pub fn hotkeys_active(&self) -> bool {
        self.attached && self.focus_active()
    }
}

#[derive(Debug)]
pub struct ActivityGate {
    state: GateState,
    expected_class: String,
}

impl Default for ActivityGate {
    fn default() -> Self {
        Self::new(TARGET_WINDOW_CLASS)
    }
}

impl ActivityGate {
    pub fn new(expected_class: impl Into<String>) -> Self {
        Self {
            state: GateState::default(),
            expected_class: expected_class.into(),
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Sample focus facts. A failed foreground query counts as "not focused".
    pub async fn sample<W: HostWindow, S: ProcessSession>(
        &self,
        window: &W,
        session: &S,
        attached: bool,
    ) -> GateState {
        let host_focused = window.is_focused().await;
        let game_focused = if attached {
            match session.foreground_window_class().await {
                Ok(class) => class == self.expected_class,
                Err(e) => {
                    debug!(category = "GATE", error = %e, "Foreground query failed");
                    false
                }
            }
        } else {
            false
        };
        GateState {
            attached,
            host_focused,
            game_focused,
        }
    }

    /// Store a new sample. Returns true when any derived flag changed.
    pub fn update(&mut self, next: GateState) -> bool {
        let prev = self.state;
        self.state = next;
        let changed = prev.attached != next.attached
            || prev.focus_active() != next.focus_active()
            || prev.hotkeys_active() != next.hotkeys_active();
        if changed {
            debug!(
                category = "GATE",
                attached = next.attached,
                focus_active = next.focus_active(),
                hotkeys_active = next.hotkeys_active(),
                "Gate changed"
            );
        }
        changed
    }

    /// Sample and store in one step.
    pub async fn poll<W: HostWindow, S: ProcessSession>(
        &mut self,
        window: &W,
        session: &S,
        attached: bool,
    ) -> bool {
        let next = self.sample(window, session, attached).await;
        self.update(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::SimulatedTarget;
    use crate::window::SimulatedWindow;

    #[test]
    fn test_detached_never_hotkeys_active() {
        for host_focused in [false, true] {
            for game_focused in [false, true] {
                let state = GateState {
                    attached: false,
                    host_focused,
                    game_focused,
                };
                assert!(!state.hotkeys_active());
            }
        }
    }

    #[test]
    fn test_derived_flags() {
        let state = GateState {
            attached: true,
            host_focused: false,
            game_focused: true,
        };
        assert!(state.focus_active());
        assert!(state.hotkeys_active());
    }

    #[tokio::test]
    async fn test_game_focus_only_sampled_when_attached() {
        let window = SimulatedWindow::new();
        window.set_focused(false);
        let target = SimulatedTarget::new();
        let gate = ActivityGate::default();

        let detached = gate.sample(&window, &target, false).await;
        assert!(!detached.game_focused);

        let attached = gate.sample(&window, &target, true).await;
        assert!(attached.game_focused);
        assert!(attached.hotkeys_active());
    }

    #[tokio::test]
    async fn test_query_failure_means_not_focused() {
        let window = SimulatedWindow::new();
        window.set_focused(false);
        let target = SimulatedTarget::new();
        target.set_foreground_class(None);
        let gate = ActivityGate::default();

        let state = gate.sample(&window, &target, true).await;
        assert!(!state.game_focused);
        assert!(!state.hotkeys_active());
    }

    #[tokio::test]
    async fn test_other_window_class_is_not_game_focus() {
        let window = SimulatedWindow::new();
        window.set_focused(false);
        let target = SimulatedTarget::new();
        target.set_foreground_class(Some("Chrome_WidgetWin_1"));
        let gate = ActivityGate::default();

        assert!(!gate.sample(&window, &target, true).await.game_focused);
    }

    #[test]
    fn test_update_reports_changes() {
        let mut gate = ActivityGate::default();
        let focused = GateState {
            attached: true,
            host_focused: true,
            game_focused: false,
        };
        assert!(gate.update(focused));
        assert!(!gate.update(focused));
        // Same derived flags, different source of focus
        assert!(!gate.update(GateState {
            attached: true,
            host_focused: false,
            game_focused: true,
        }));
        assert!(gate.update(GateState::default()));
    }
}
