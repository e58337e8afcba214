//! Window Presence Animator
//!
//! Collapses the window to a compact bar and expands it back with a stepped
//! ease-out-cubic resize, and re-sizes the window (debounced) when the app
//! scale changes.
//!
//! Both paths run as `spawn_local` tasks on the controller's `LocalSet` and
//! share one `PresenceState`. While a transition runs, `animating` is set and
//! the scale path leaves geometry alone. A new collapse toggle is refused
//! rather than queued.

use std::cell::RefCell;
use std::rc::Rc;

use tokio::task::{spawn_local, AbortHandle, JoinHandle};
use tracing::debug;

use super::layout::{BASE_SIZE, COLLAPSED_SIZE, MIN_EXPANDED_SIZE};
use super::HostWindow;
use crate::config::defaults::{COLLAPSE_DURATION, EXPAND_DURATION, SCALE_RESIZE_DEBOUNCE};
use crate::transitions::{LogicalSize, StepSchedule};

/// Scale changes smaller than this do not resize
const SCALE_EPSILON: f32 = 0.001;

#[derive(Debug)]
struct PresenceState {
    collapsed: bool,
    animating: bool,
    /// Size to return to when expanding
    expanded_size: Option<LogicalSize>,
    scale: f32,
    /// Scale the geometry was last sized for
    prev_scale: f32,
    debounce: Option<AbortHandle>,
}

pub struct WindowPresenceAnimator<W> {
    window: W,
    state: Rc<RefCell<PresenceState>>,
}

impl<W: Clone> Clone for WindowPresenceAnimator<W> {
    fn clone(&self) -> Self {
        Self {
            window: self.window.clone(),
            state: Rc::clone(&self.state),
        }
    }
}

impl<W: HostWindow + Clone + 'static> WindowPresenceAnimator<W> {
    pub fn new(window: W, scale: f32) -> Self {
        Self {
            window,
            state: Rc::new(RefCell::new(PresenceState {
                collapsed: false,
                animating: false,
                expanded_size: None,
                scale,
                prev_scale: scale,
                debounce: None,
            })),
        }
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn is_collapsed(&self) -> bool {
        self.state.borrow().collapsed
    }

    pub fn is_animating(&self) -> bool {
        self.state.borrow().animating
    }

    pub fn scale(&self) -> f32 {
        self.state.borrow().scale
    }

    /// Start collapsing or expanding. Returns `None` while a transition is
    /// already running. Must be called inside a `LocalSet`.
    pub fn toggle_collapse(&self) -> Option<JoinHandle<()>> {
        let (collapsing, target) = {
            let mut state = self.state.borrow_mut();
            if state.animating {
                debug!(category = "WINDOW", "Collapse toggle ignored, animation running");
                return None;
            }
            state.animating = true;
            state.collapsed = !state.collapsed;
            let scale = state.scale;
            if state.collapsed {
                state.expanded_size = Some(BASE_SIZE.scaled(scale));
                (true, COLLAPSED_SIZE.scaled(scale))
            } else {
                let target = state
                    .expanded_size
                    .unwrap_or_else(|| BASE_SIZE.scaled(scale));
                (false, target)
            }
        };

        let this = self.clone();
        Some(spawn_local(async move {
            let duration = if collapsing {
                COLLAPSE_DURATION
            } else {
                EXPAND_DURATION
            };
            let from = this.window.logical_size().await;
            debug!(
                category = "WINDOW",
                collapsing,
                from = %from,
                to = %target,
                "Presence transition started"
            );
            this.animate(from, target, StepSchedule::for_duration(duration))
                .await;

            let mut state = this.state.borrow_mut();
            state.animating = false;
            if !collapsing {
                state.expanded_size = Some(target);
            }
        }))
    }

    async fn animate(&self, from: LogicalSize, to: LogicalSize, schedule: StepSchedule) {
        for frame in schedule.frames(from, to) {
            if let Some(size) = frame {
                self.window.set_logical_size(size).await;
            }
            tokio::time::sleep(schedule.delay).await;
        }
    }

    /// Record a new app scale and schedule a debounced resize for it. A
    /// pending resize from an earlier change is cancelled. Must be called
    /// inside a `LocalSet`.
    pub fn on_scale_changed(&self, scale: f32) -> Option<JoinHandle<()>> {
        let mut state = self.state.borrow_mut();
        state.scale = scale;
        if state.animating {
            state.prev_scale = scale;
            return None;
        }
        if (scale - state.prev_scale).abs() < SCALE_EPSILON {
            return None;
        }
        if let Some(pending) = state.debounce.take() {
            pending.abort();
        }

        let this = self.clone();
        let handle = spawn_local(async move {
            tokio::time::sleep(SCALE_RESIZE_DEBOUNCE).await;
            this.resize_for_scale(scale).await;
        });
        state.debounce = Some(handle.abort_handle());
        Some(handle)
    }

    async fn resize_for_scale(&self, scale: f32) {
        let (collapsed, animating) = {
            let state = self.state.borrow();
            (state.collapsed, state.animating)
        };
        if animating {
            debug!(category = "WINDOW", "Scale resize skipped, animation running");
            let mut state = self.state.borrow_mut();
            state.prev_scale = scale;
            state.debounce = None;
            return;
        }

        let size = if collapsed {
            COLLAPSED_SIZE.scaled(scale)
        } else {
            BASE_SIZE.scaled(scale).at_least(MIN_EXPANDED_SIZE)
        };
        debug!(category = "WINDOW", scale, size = %size, "Resizing for scale");
        self.window.set_logical_size(size).await;

        let mut state = self.state.borrow_mut();
        if !collapsed {
            state.expanded_size = Some(size);
        }
        state.prev_scale = scale;
        state.debounce = None;
    }
}
