//! Controller and event loop
//!
//! The controller owns the application state value (`AppState`) and every
//! bridge, and is the single writer of all of it. Events arrive from the
//! command channel, the hook and pointer trigger channels, and a 500ms gate
//! poll; each is handled to completion before the next is taken.
//!
//! Window animations and the debounced scale resize are the only work that
//! outlives an event. They run as `spawn_local` tasks, so `run` must be
//! driven inside a `LocalSet`.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::bindings::HotkeyBindings;
use crate::capture::{CaptureController, CaptureEnd, CaptureOutcome, KeyPress};
use crate::chord::{Chord, PointerButton};
use crate::config::defaults::{DEFAULT_SUPER_RUN_SPEED, GATE_POLL_INTERVAL, TARGET_EXE};
use crate::config::{self, clamp_app_scale, Settings};
use crate::error::{ModextError, ResultExt, SessionError};
use crate::features::{self, FeatureGroup};
use crate::gate::{ActivityGate, GateState};
use crate::hotkeys::{
    Dispatch, Dispatcher, HotkeyRegistrar, InputHookBridge, ReconcileReport, UiAction,
};
use crate::logging;
use crate::notifications::{NotificationCenter, Toast};
use crate::target::{OperationExecutor, ProcessSession};
use crate::toggles::ToggleReconciler;
use crate::window::{HostWindow, WindowPresenceAnimator};

/// Log lines included in a status snapshot
const STATUS_LOG_LINES: usize = 10;

/// Everything the controller can be asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    Attach,
    Detach,
    Status,
    SetFeature { id: String, enabled: bool },
    ToggleFeature { id: String },
    ToggleGroup { group: FeatureGroup },
    SuperRun { speed: Option<f32> },
    ResetSuperRun,
    /// Start recording a chord for `id`
    BeginCapture { id: String },
    CaptureKey(KeyPress),
    CapturePointer(PointerButton),
    ClearBinding { id: String },
    /// A live hook reported its target id
    HookFired(String),
    /// The pointer channel delivered a chord label
    PointerChord(Chord),
    ToggleCollapse,
    SetScale(f32),
    SetNonActivating(bool),
    SetAlwaysOnTop(bool),
    PollGate,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub attached: bool,
    pub pid: Option<u32>,
}

/// Mutable application state, written only by the controller
#[derive(Debug)]
pub struct AppState {
    pub toggles: ToggleReconciler,
    pub gate: ActivityGate,
    pub bindings: HotkeyBindings,
    pub capture: CaptureController,
    pub settings: Settings,
    pub attachment: Attachment,
    pub notifications: NotificationCenter,
    /// Mode the window is in right now; differs from the setting during capture
    pub window_non_activating: bool,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            toggles: ToggleReconciler::new(),
            gate: ActivityGate::default(),
            bindings: HotkeyBindings::from_settings(&settings.feature_hotkeys),
            capture: CaptureController::new(),
            window_non_activating: settings.non_activate_window,
            settings,
            attachment: Attachment::default(),
            notifications: NotificationCenter::new(),
        }
    }
}

/// Point-in-time view returned by the status command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub attached: bool,
    pub pid: Option<u32>,
    pub active_count: usize,
    pub enabled: Vec<&'static str>,
    pub super_run: bool,
    pub bindings: IndexMap<String, String>,
    pub gate: GateState,
    pub collapsed: bool,
    pub capture_target: Option<String>,
    pub toasts: Vec<Toast>,
    /// Newest categorized log lines first
    pub recent_logs: Vec<String>,
}

pub struct Controller<E, S, H, W> {
    executor: E,
    session: S,
    window: W,
    registrar: HotkeyRegistrar<H>,
    dispatcher: Dispatcher,
    presence: WindowPresenceAnimator<W>,
    settings_path: Option<PathBuf>,
    state: AppState,
}

impl<E, S, H, W> Controller<E, S, H, W>
where
    E: OperationExecutor,
    S: ProcessSession,
    H: InputHookBridge,
    W: HostWindow + Clone + 'static,
{
    /// `settings_path = None` keeps settings in memory only.
    pub fn new(
        executor: E,
        session: S,
        hooks: H,
        window: W,
        settings: Settings,
        settings_path: Option<PathBuf>,
    ) -> Self {
        let presence = WindowPresenceAnimator::new(window.clone(), settings.app_scale);
        Self {
            executor,
            session,
            window,
            registrar: HotkeyRegistrar::new(hooks),
            dispatcher: Dispatcher::new(),
            presence,
            settings_path,
            state: AppState::new(settings),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn registrar(&self) -> &HotkeyRegistrar<H> {
        &self.registrar
    }

    pub fn presence(&self) -> &WindowPresenceAnimator<W> {
        &self.presence
    }

    /// Apply persisted window modes, take a first gate sample and install hooks.
    pub async fn startup(&mut self) {
        self.window
            .set_always_on_top(self.state.settings.always_on_top)
            .await;
        self.window
            .set_non_activating(self.state.window_non_activating)
            .await;
        self.state.gate.poll(&self.window, &self.session, false).await;
        self.reconcile_hooks();
        info!(
            category = "SESSION",
            bindings = self.state.bindings.len(),
            scale = self.state.settings.app_scale,
            "Controller started"
        );
    }

    /// Drive the controller until a shutdown event or the command channel closes.
    pub async fn run(
        mut self,
        commands: async_channel::Receiver<ControllerEvent>,
        hooks: async_channel::Receiver<String>,
        pointer: async_channel::Receiver<Chord>,
    ) {
        self.startup().await;

        let mut poll = tokio::time::interval(GATE_POLL_INTERVAL);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let event = tokio::select! {
                command = commands.recv() => match command {
                    Ok(event) => event,
                    Err(_) => {
                        info!(category = "SESSION", "Command channel closed");
                        break;
                    }
                },
                Ok(target_id) = hooks.recv() => ControllerEvent::HookFired(target_id),
                Ok(chord) = pointer.recv() => ControllerEvent::PointerChord(chord),
                _ = poll.tick() => ControllerEvent::PollGate,
            };
            if self.handle(event).await == Flow::Stop {
                break;
            }
        }

        self.shutdown().await;
    }

    pub async fn handle(&mut self, event: ControllerEvent) -> Flow {
        if !matches!(event, ControllerEvent::PollGate) {
            debug!(category = "SESSION", event = ?event, "Handling event");
        }
        match event {
            ControllerEvent::Attach => self.attach().await,
            ControllerEvent::Detach => self.detach().await,
            ControllerEvent::Status => {
                let snapshot = self.status();
                if let Some(json) = serde_json::to_string(&snapshot).log_err() {
                    info!(category = "SESSION", status = %json, "Status");
                }
            }
            ControllerEvent::SetFeature { id, enabled } => self.set_feature(&id, enabled).await,
            ControllerEvent::ToggleFeature { id } => self.toggle_feature(&id).await,
            ControllerEvent::ToggleGroup { group } => self.toggle_group(group).await,
            ControllerEvent::SuperRun { speed } => {
                let speed = speed.unwrap_or(DEFAULT_SUPER_RUN_SPEED);
                self.state
                    .toggles
                    .apply_super_run(
                        &self.executor,
                        &mut self.state.notifications,
                        self.state.attachment.attached,
                        speed,
                    )
                    .await;
            }
            ControllerEvent::ResetSuperRun => {
                self.state
                    .toggles
                    .reset_super_run(
                        &self.executor,
                        &mut self.state.notifications,
                        self.state.attachment.attached,
                    )
                    .await;
            }
            ControllerEvent::BeginCapture { id } => self.begin_capture(id).await,
            ControllerEvent::CaptureKey(press) => {
                let outcome = self
                    .state
                    .capture
                    .handle_key(&press, &mut self.state.bindings);
                self.after_capture_input(outcome).await;
            }
            ControllerEvent::CapturePointer(button) => {
                let outcome = self
                    .state
                    .capture
                    .handle_pointer(button, &mut self.state.bindings);
                self.after_capture_input(outcome).await;
            }
            ControllerEvent::ClearBinding { id } => {
                if self.state.bindings.remove(&id).is_some() {
                    info!(category = "HOTKEY", target_id = %id, "Binding cleared");
                    self.persist_settings();
                    self.reconcile_hooks();
                }
            }
            ControllerEvent::HookFired(target_id) => {
                if self.state.capture.is_active() {
                    debug!(
                        category = "HOTKEY",
                        target_id = %target_id,
                        "Hook ignored during capture"
                    );
                    return Flow::Continue;
                }
                let gate = self.state.gate.state();
                let dispatch = self.dispatcher.on_hook(&target_id, &gate, Instant::now());
                self.run_dispatch(dispatch).await;
            }
            ControllerEvent::PointerChord(chord) => {
                let gate = self.state.gate.state();
                let dispatch = self.dispatcher.on_pointer(
                    &chord,
                    &self.state.bindings,
                    self.state.capture.is_active(),
                    &gate,
                    Instant::now(),
                );
                self.run_dispatch(dispatch).await;
            }
            ControllerEvent::ToggleCollapse => self.toggle_collapse(),
            ControllerEvent::SetScale(scale) => {
                let scale = clamp_app_scale(scale);
                self.state.settings.app_scale = scale;
                self.presence.on_scale_changed(scale);
                self.persist_settings();
            }
            ControllerEvent::SetNonActivating(enabled) => {
                self.state.settings.non_activate_window = enabled;
                // During capture the window stays activating; the new mode lands on exit
                if !self.state.capture.is_active() {
                    self.apply_non_activating(enabled).await;
                }
                self.persist_settings();
            }
            ControllerEvent::SetAlwaysOnTop(enabled) => {
                self.state.settings.always_on_top = enabled;
                self.window.set_always_on_top(enabled).await;
                self.persist_settings();
            }
            ControllerEvent::PollGate => self.poll_gate().await,
            ControllerEvent::Shutdown => return Flow::Stop,
        }
        Flow::Continue
    }

    pub fn status(&self) -> StatusSnapshot {
        let state = &self.state;
        StatusSnapshot {
            attached: state.attachment.attached,
            pid: state.attachment.pid,
            active_count: state.toggles.active_count(),
            enabled: state.toggles.enabled_ids(),
            super_run: state.toggles.super_run_enabled(),
            bindings: state.bindings.to_settings(),
            gate: state.gate.state(),
            collapsed: self.presence.is_collapsed(),
            capture_target: state.capture.target().map(str::to_string),
            toasts: state.notifications.visible(Instant::now()),
            recent_logs: logging::get_last_logs(STATUS_LOG_LINES),
        }
    }

    async fn attach(&mut self) {
        match self.session.attach().await {
            Ok(info) => {
                self.state.attachment = Attachment {
                    attached: true,
                    pid: Some(info.pid),
                };
                info!(
                    category = "SESSION",
                    pid = info.pid,
                    base = format_args!("{:#x}", info.base),
                    "Attached"
                );
                self.state
                    .notifications
                    .success(format!("Attached to {}", TARGET_EXE));
                self.state.gate.poll(&self.window, &self.session, true).await;
                self.reconcile_hooks();
            }
            Err(e) => {
                warn!(category = "SESSION", error = %e, "Attach failed");
                match e {
                    SessionError::ProcessNotFound(_) => {
                        self.state.notifications.error(format!(
                            "{} not found. Launch the game and try again.",
                            TARGET_EXE
                        ));
                    }
                    other => {
                        self.state.notifications.report(&ModextError::from(other));
                    }
                }
            }
        }
    }

    async fn detach(&mut self) {
        if let Err(e) = self.session.detach().await {
            warn!(category = "SESSION", error = %e, "Detach failed");
            self.state.notifications.report(&ModextError::from(e));
            return;
        }
        self.state.attachment = Attachment::default();
        // Restore data went away with the session
        self.state.toggles.clear();
        info!(category = "SESSION", "Detached");
        self.state
            .notifications
            .success(format!("Detached from {}", TARGET_EXE));
        self.state.gate.poll(&self.window, &self.session, false).await;
        self.reconcile_hooks();
    }

    async fn set_feature(&mut self, id: &str, enabled: bool) {
        let Some(feature) = features::find(id) else {
            warn!(category = "TOGGLE", feature_id = id, "Unknown feature");
            return;
        };
        self.state
            .toggles
            .set_feature_state(
                &self.executor,
                &mut self.state.notifications,
                self.state.attachment.attached,
                feature,
                enabled,
            )
            .await;
    }

    async fn toggle_feature(&mut self, id: &str) {
        let Some(feature) = features::find(id) else {
            warn!(category = "TOGGLE", feature_id = id, "Unknown feature");
            return;
        };
        self.state
            .toggles
            .toggle_feature(
                &self.executor,
                &mut self.state.notifications,
                self.state.attachment.attached,
                feature,
            )
            .await;
    }

    async fn toggle_group(&mut self, group: FeatureGroup) {
        let members = features::group(group);
        self.state
            .toggles
            .toggle_group(
                &self.executor,
                &mut self.state.notifications,
                self.state.attachment.attached,
                &members,
            )
            .await;
    }

    async fn run_dispatch(&mut self, dispatch: Dispatch) {
        match dispatch {
            Dispatch::ToggleFeature(feature) => {
                self.state
                    .toggles
                    .toggle_feature(
                        &self.executor,
                        &mut self.state.notifications,
                        self.state.attachment.attached,
                        feature,
                    )
                    .await;
            }
            Dispatch::RunAction(UiAction::ToggleCollapse) => self.toggle_collapse(),
            Dispatch::Ignored(reason) => {
                debug!(category = "HOTKEY", reason = ?reason, "Trigger ignored");
            }
        }
    }

    fn toggle_collapse(&mut self) {
        if self.presence.toggle_collapse().is_some() {
            info!(
                category = "WINDOW",
                collapsed = self.presence.is_collapsed(),
                "Presence toggled"
            );
        }
    }

    async fn begin_capture(&mut self, id: String) {
        let effects = self
            .state
            .capture
            .begin(id, self.state.window_non_activating);
        if effects.clear_non_activating {
            self.apply_non_activating(false).await;
        }
        self.reconcile_hooks();
    }

    async fn after_capture_input(&mut self, outcome: CaptureOutcome) {
        match outcome {
            CaptureOutcome::Finished(end) => self.finish_capture(end).await,
            CaptureOutcome::Pending => {}
            CaptureOutcome::NotListening => {
                debug!(category = "CAPTURE", "Capture input with no session");
            }
        }
    }

    async fn finish_capture(&mut self, end: CaptureEnd) {
        if let Some(previous) = end.restore_non_activating {
            // A change made during the session wins over the value it started with
            let mode = self.state.settings.non_activate_window;
            if mode != previous {
                debug!(
                    category = "CAPTURE",
                    previous,
                    mode,
                    "Non-activating changed during capture"
                );
            }
            self.apply_non_activating(mode).await;
        }
        self.persist_settings();
        self.reconcile_hooks();
    }

    async fn apply_non_activating(&mut self, enabled: bool) {
        if self.state.window_non_activating == enabled {
            return;
        }
        self.window.set_non_activating(enabled).await;
        self.state.window_non_activating = enabled;
    }

    async fn poll_gate(&mut self) {
        self.state.notifications.prune(Instant::now());
        let attached = self.state.attachment.attached;
        if self
            .state
            .gate
            .poll(&self.window, &self.session, attached)
            .await
        {
            self.reconcile_hooks();
        }
    }

    fn reconcile_hooks(&mut self) -> ReconcileReport {
        self.registrar.reconcile(
            &self.state.bindings,
            self.state.capture.is_active(),
            self.state.gate.state().hotkeys_active(),
        )
    }

    /// Save settings unless a capture session is open. Failures are logged only.
    fn persist_settings(&mut self) {
        if self.state.capture.is_active() {
            debug!(category = "CONFIG", "Capture active, settings not saved");
            return;
        }
        self.state.settings.feature_hotkeys = self.state.bindings.to_settings();
        if let Some(path) = &self.settings_path {
            config::save_settings(path, &self.state.settings).warn_on_err();
        }
    }

    async fn shutdown(&mut self) {
        self.registrar.teardown();
        if self.state.attachment.attached {
            self.session.detach().await.warn_on_err();
            self.state.attachment = Attachment::default();
            self.state.toggles.clear();
        }
        info!(category = "SESSION", "Controller stopped");
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
