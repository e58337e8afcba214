//! Host Window Module
//!
//! Geometry, focus and window-mode calls for the controller's own window.
//!
//! **Key Rules:**
//! - Geometry is only written by the presence animator and the debounced
//!   scale resize (see `animator`); both honor the animating flag
//! - `set_logical_size` may be slow; callers await it before the next step
//! - Non-activating mode is cleared for the length of a capture session

mod animator;

pub use animator::WindowPresenceAnimator;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use crate::config::defaults::{
    COLLAPSED_HEIGHT, COLLAPSED_WIDTH, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH,
    MIN_EXPANDED_HEIGHT, MIN_EXPANDED_WIDTH,
};
use crate::transitions::LogicalSize;

/// Layout sizes before scaling
pub mod layout {
    use super::*;

    pub const BASE_SIZE: LogicalSize =
        LogicalSize::new(DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT);
    pub const COLLAPSED_SIZE: LogicalSize = LogicalSize::new(COLLAPSED_WIDTH, COLLAPSED_HEIGHT);
    pub const MIN_EXPANDED_SIZE: LogicalSize =
        LogicalSize::new(MIN_EXPANDED_WIDTH, MIN_EXPANDED_HEIGHT);
}

#[allow(async_fn_in_trait)]
pub trait HostWindow {
    async fn logical_size(&self) -> LogicalSize;
    async fn set_logical_size(&self, size: LogicalSize);
    async fn is_focused(&self) -> bool;
    async fn set_non_activating(&self, enabled: bool);
    async fn set_always_on_top(&self, enabled: bool);
}

#[derive(Debug)]
struct WindowState {
    size: LogicalSize,
    focused: bool,
    non_activating: bool,
    always_on_top: bool,
    resize_log: Vec<LogicalSize>,
    resize_latency: Duration,
}

/// In-memory window; clones share state.
#[derive(Debug, Clone)]
pub struct SimulatedWindow {
    inner: Rc<RefCell<WindowState>>,
}

impl Default for SimulatedWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedWindow {
    /// A focused window at the default size.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(WindowState {
                size: layout::BASE_SIZE,
                focused: true,
                non_activating: false,
                always_on_top: false,
                resize_log: Vec::new(),
                resize_latency: Duration::ZERO,
            })),
        }
    }

    pub fn set_focused(&self, focused: bool) {
        self.inner.borrow_mut().focused = focused;
    }

    /// Make every resize take `latency` to complete.
    pub fn set_resize_latency(&self, latency: Duration) {
        self.inner.borrow_mut().resize_latency = latency;
    }

    pub fn size(&self) -> LogicalSize {
        self.inner.borrow().size
    }

    /// Every size written so far, oldest first
    pub fn resize_log(&self) -> Vec<LogicalSize> {
        self.inner.borrow().resize_log.clone()
    }

    pub fn clear_resize_log(&self) {
        self.inner.borrow_mut().resize_log.clear();
    }

    pub fn is_non_activating(&self) -> bool {
        self.inner.borrow().non_activating
    }

    pub fn is_always_on_top(&self) -> bool {
        self.inner.borrow().always_on_top
    }
}

impl HostWindow for SimulatedWindow {
    async fn logical_size(&self) -> LogicalSize {
        tokio::task::yield_now().await;
        self.inner.borrow().size
    }

    async fn set_logical_size(&self, size: LogicalSize) {
        let latency = self.inner.borrow().resize_latency;
        if latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.inner.borrow_mut();
        state.size = size;
        state.resize_log.push(size);
        debug!(category = "WINDOW", size = %size, "Window resized");
    }

    async fn is_focused(&self) -> bool {
        self.inner.borrow().focused
    }

    async fn set_non_activating(&self, enabled: bool) {
        self.inner.borrow_mut().non_activating = enabled;
    }

    async fn set_always_on_top(&self, enabled: bool) {
        self.inner.borrow_mut().always_on_top = enabled;
    }
}
