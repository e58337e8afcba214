//! Transient user notifications
//!
//! Non-blocking toasts that auto-dismiss after `TOAST_LIFETIME`. Expired toasts
//! are pruned on every push and on the controller's gate poll tick, so the
//! queue holds at most one lifetime's worth of toasts. Nothing here owns a timer.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::defaults::TOAST_LIFETIME;
use crate::error::{ErrorSeverity, ModextError};

/// Toast variant determines styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ToastVariant {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub id: u64,
    pub variant: ToastVariant,
    pub message: String,
    #[serde(skip)]
    created_at: Instant,
}

impl Toast {
    fn is_expired(&self, now: Instant, lifetime: Duration) -> bool {
        now.saturating_duration_since(self.created_at) >= lifetime
    }
}

/// Queue of live toasts in creation order
#[derive(Debug)]
pub struct NotificationCenter {
    toasts: VecDeque<Toast>,
    lifetime: Duration,
    next_id: u64,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_lifetime(TOAST_LIFETIME)
    }

    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            toasts: VecDeque::new(),
            lifetime,
            next_id: 1,
        }
    }

    pub fn push(&mut self, variant: ToastVariant, message: impl Into<String>) -> u64 {
        let now = Instant::now();
        self.prune(now);
        let id = self.next_id;
        self.next_id += 1;
        let message = message.into();
        match variant {
            ToastVariant::Success => info!(toast_id = id, "Toast: {}", message),
            ToastVariant::Error => warn!(toast_id = id, "Toast: {}", message),
        }
        self.toasts.push_back(Toast {
            id,
            variant,
            message,
            created_at: now,
        });
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastVariant::Success, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastVariant::Error, message)
    }

    /// Surface a domain error; anything below `Error` severity is log-only.
    pub fn report(&mut self, err: &ModextError) -> Option<u64> {
        match err.severity() {
            ErrorSeverity::Error => Some(self.error(err.user_message())),
            _ => {
                warn!(error = %err, "Suppressed notification");
                None
            }
        }
    }

    pub fn dismiss(&mut self, id: u64) {
        self.toasts.retain(|t| t.id != id);
    }

    /// Drop toasts whose lifetime has elapsed at `now`.
    pub fn prune(&mut self, now: Instant) {
        let lifetime = self.lifetime;
        self.toasts.retain(|t| !t.is_expired(now, lifetime));
    }

    /// Live toasts at `now`, oldest first
    pub fn visible(&self, now: Instant) -> Vec<Toast> {
        self.toasts
            .iter()
            .filter(|t| !t.is_expired(now, self.lifetime))
            .cloned()
            .collect()
    }

    /// Total toasts ever pushed
    pub fn pushed_count(&self) -> u64 {
        self.next_id - 1
    }

    /// Toasts pushed with the given variant that are still queued
    pub fn count(&self, variant: ToastVariant) -> usize {
        self.toasts.iter().filter(|t| t.variant == variant).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExecutorError, HookError};

    #[tokio::test(start_paused = true)]
    async fn test_toasts_expire_after_lifetime() {
        let mut center = NotificationCenter::new();
        center.success("Attached to Sky.exe");

        tokio::time::advance(Duration::from_millis(3_900)).await;
        assert_eq!(center.visible(Instant::now()).len(), 1);

        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(center.visible(Instant::now()).is_empty());
        assert_eq!(center.pushed_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toasts_expire_independently() {
        let mut center = NotificationCenter::new();
        let first = center.error("first");
        tokio::time::advance(Duration::from_secs(2)).await;
        let second = center.error("second");
        tokio::time::advance(Duration::from_secs(2)).await;

        let ids: Vec<u64> = center.visible(Instant::now()).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second]);
        assert_ne!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_prunes_expired_toasts() {
        let mut center = NotificationCenter::new();
        for _ in 0..10 {
            center.error("Failed to apply godmode");
            tokio::time::advance(Duration::from_secs(1)).await;
        }
        // Only the last four are within their lifetime
        assert_eq!(center.count(ToastVariant::Error), 4);
        assert_eq!(center.pushed_count(), 10);

        tokio::time::advance(Duration::from_secs(4)).await;
        center.prune(Instant::now());
        assert_eq!(center.count(ToastVariant::Error), 0);
    }

    #[test]
    fn test_report_only_toasts_errors() {
        let mut center = NotificationCenter::new();
        let hook: ModextError = HookError::Unparsable("Ctrl+".into()).into();
        assert!(center.report(&hook).is_none());

        let exec: ModextError = ExecutorError::NotAttached.into();
        assert!(center.report(&exec).is_some());
        assert_eq!(center.count(ToastVariant::Error), 1);
    }

    #[test]
    fn test_dismiss() {
        let mut center = NotificationCenter::new();
        let id = center.success("hello");
        center.dismiss(id);
        assert_eq!(center.count(ToastVariant::Success), 0);
    }
}
