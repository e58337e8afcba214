//! Window Transitions Module
//!
//! Easing curves and interpolation for the stepped window presence animation.
//!
//! # Key Components
//!
//! - `Lerp`: linear interpolation between two values of the same type
//! - `LogicalSize`: window size in logical pixels, interpolated per axis and rounded
//! - `StepSchedule`: how many samples a transition takes and how long each one waits
//!
//! ```ignore
//! use modext::transitions::{ease_out_cubic, Lerp, LogicalSize, StepSchedule};
//!
//! let schedule = StepSchedule::for_duration(Duration::from_millis(220));
//! let from = LogicalSize::new(1000, 760);
//! let to = LogicalSize::new(520, 56);
//! for t in schedule.progress() {
//!     let size = from.lerp(&to, ease_out_cubic(t));
//! }
//! ```

use std::time::Duration;

use serde::Serialize;

use crate::config::defaults::{ANIMATION_STEP_MS, MIN_ANIMATION_DELAY, MIN_ANIMATION_STEPS};

// ============================================================================
// Lerp Trait
// ============================================================================

/// A value which can be linearly interpolated with another value of the same type.
///
/// The `delta` parameter is a value from 0.0 to 1.0 where:
/// - 0.0 returns `self`
/// - 1.0 returns `to`
/// - Values in between return a linear interpolation
pub trait Lerp {
    fn lerp(&self, to: &Self, delta: f32) -> Self;
}

impl Lerp for f64 {
    #[inline]
    fn lerp(&self, to: &Self, delta: f32) -> Self {
        self + (to - self) * delta as f64
    }
}

// ============================================================================
// Easing Functions
// ============================================================================

/// Ease out cubic - fast start, strong deceleration, used for collapse/expand
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

// ============================================================================
// Window Size
// ============================================================================

/// Window size in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LogicalSize {
    pub width: u32,
    pub height: u32,
}

impl LogicalSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Multiply both axes by `scale`, rounding to whole pixels.
    pub fn scaled(self, scale: f32) -> Self {
        Self {
            width: (self.width as f64 * scale as f64).round() as u32,
            height: (self.height as f64 * scale as f64).round() as u32,
        }
    }

    /// Raise each axis to at least the given minimum.
    pub fn at_least(self, min: LogicalSize) -> Self {
        Self {
            width: self.width.max(min.width),
            height: self.height.max(min.height),
        }
    }
}

impl Lerp for LogicalSize {
    fn lerp(&self, to: &Self, delta: f32) -> Self {
        let w = (self.width as f64).lerp(&(to.width as f64), delta);
        let h = (self.height as f64).lerp(&(to.height as f64), delta);
        Self {
            width: w.round().max(0.0) as u32,
            height: h.round().max(0.0) as u32,
        }
    }
}

impl std::fmt::Display for LogicalSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ============================================================================
// Step Schedule
// ============================================================================

/// Sampling plan for a stepped transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSchedule {
    pub steps: u32,
    pub delay: Duration,
}

impl StepSchedule {
    /// At least six samples, one per ~40ms, never waiting less than 10ms between them.
    pub fn for_duration(duration: Duration) -> Self {
        let millis = duration.as_millis() as f64;
        let steps = ((millis / ANIMATION_STEP_MS as f64).round() as u32).max(MIN_ANIMATION_STEPS);
        let delay_ms = (millis / steps as f64).round() as u64;
        Self {
            steps,
            delay: Duration::from_millis(delay_ms).max(MIN_ANIMATION_DELAY),
        }
    }

    /// Normalized progress of each sample, ending exactly at 1.0
    pub fn progress(&self) -> impl Iterator<Item = f32> {
        let steps = self.steps;
        (1..=steps).map(move |i| i as f32 / steps as f32)
    }

    /// One entry per step: the eased size, or `None` when it repeats the previous step.
    pub fn frames(&self, from: LogicalSize, to: LogicalSize) -> Vec<Option<LogicalSize>> {
        let mut last: Option<LogicalSize> = None;
        self.progress()
            .map(|t| {
                let next = from.lerp(&to, ease_out_cubic(t));
                if last == Some(next) {
                    None
                } else {
                    last = Some(next);
                    Some(next)
                }
            })
            .collect()
    }
}
