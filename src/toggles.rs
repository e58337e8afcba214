//! Toggle Reconciler
//!
//! Keeps the controller's belief about which features are enabled in step with
//! the executor. Beliefs are updated optimistically, operations are applied
//! strictly in declared order, and a failure reverts the belief without
//! compensating the operations that already succeeded.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::defaults::DEFAULT_RUN_SPEED;
use crate::error::{ExecutorError, ModextError};
use crate::features::{Feature, Operation};
use crate::logging;
use crate::notifications::NotificationCenter;
use crate::target::OperationExecutor;

/// Enables the custom run speed
pub const SUPER_RUN_PATCH: Operation = Operation::Patch {
    offset: 0x27BD818,
    bytes: &[0x00],
};
pub const RUN_SPEED_OFFSET: usize = 0x27BDA38;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    NotAttached,
    /// Desired state already matches the belief
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Skipped(SkipReason),
    Applied,
    /// Operation `failed_at` (0-based) failed; later operations were not issued
    Reverted {
        failed_at: usize,
        error: ExecutorError,
    },
}

impl ToggleOutcome {
    fn label(&self) -> &'static str {
        match self {
            ToggleOutcome::Skipped(SkipReason::NotAttached) => "skipped_not_attached",
            ToggleOutcome::Skipped(SkipReason::Unchanged) => "skipped_unchanged",
            ToggleOutcome::Applied => "applied",
            ToggleOutcome::Reverted { .. } => "reverted",
        }
    }
}

/// Owner of the feature belief map and the Super Run flag
#[derive(Debug, Default)]
pub struct ToggleReconciler {
    belief: HashMap<&'static str, bool>,
    super_run_enabled: bool,
}

impl ToggleReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current belief for a feature; never-toggled features are off.
    pub fn is_enabled(&self, feature_id: &str) -> bool {
        self.belief.get(feature_id).copied().unwrap_or(false)
    }

    pub fn super_run_enabled(&self) -> bool {
        self.super_run_enabled
    }

    /// Enabled features plus Super Run
    pub fn active_count(&self) -> usize {
        self.belief.values().filter(|on| **on).count() + usize::from(self.super_run_enabled)
    }

    /// Ids believed enabled, sorted for stable output
    pub fn enabled_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self
            .belief
            .iter()
            .filter(|(_, on)| **on)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Forget everything; used when the session that held the patches goes away.
    pub fn clear(&mut self) {
        self.belief.clear();
        self.super_run_enabled = false;
    }

    /// Drive one feature to `desired`.
    pub async fn set_feature_state<E: OperationExecutor>(
        &mut self,
        executor: &E,
        notifier: &mut NotificationCenter,
        attached: bool,
        feature: &'static Feature,
        desired: bool,
    ) -> ToggleOutcome {
        let outcome = self
            .apply_feature(executor, notifier, attached, feature, desired)
            .await;
        logging::log_toggle_event(feature.id, desired, outcome.label());
        outcome
    }

    async fn apply_feature<E: OperationExecutor>(
        &mut self,
        executor: &E,
        notifier: &mut NotificationCenter,
        attached: bool,
        feature: &'static Feature,
        desired: bool,
    ) -> ToggleOutcome {
        if !attached {
            return ToggleOutcome::Skipped(SkipReason::NotAttached);
        }
        let previous = self.is_enabled(feature.id);
        if previous == desired {
            return ToggleOutcome::Skipped(SkipReason::Unchanged);
        }

        self.belief.insert(feature.id, desired);

        for (index, op) in feature.operations.iter().enumerate() {
            if let Err(error) = executor.apply(op, desired).await {
                warn!(
                    category = "TOGGLE",
                    feature_id = feature.id,
                    op_index = index,
                    offset = format_args!("{:#x}", op.offset()),
                    error = %error,
                    "Operation failed, reverting belief"
                );
                self.belief.insert(feature.id, previous);
                notifier.report(&ModextError::from(error.clone()));
                return ToggleOutcome::Reverted {
                    failed_at: index,
                    error,
                };
            }
        }
        ToggleOutcome::Applied
    }

    /// Flip a feature relative to its current belief.
    pub async fn toggle_feature<E: OperationExecutor>(
        &mut self,
        executor: &E,
        notifier: &mut NotificationCenter,
        attached: bool,
        feature: &'static Feature,
    ) -> ToggleOutcome {
        let desired = !self.is_enabled(feature.id);
        self.set_feature_state(executor, notifier, attached, feature, desired)
            .await
    }

    /// Turn every member on if any is off, else turn every member off.
    ///
    /// Members are processed in order and a failure never stops later members.
    pub async fn toggle_group<E: OperationExecutor>(
        &mut self,
        executor: &E,
        notifier: &mut NotificationCenter,
        attached: bool,
        features: &[&'static Feature],
    ) -> Vec<ToggleOutcome> {
        if !attached || features.is_empty() {
            return Vec::new();
        }
        let desired = features.iter().any(|f| !self.is_enabled(f.id));
        debug!(category = "TOGGLE", members = features.len(), desired, "Group toggle");

        let mut outcomes = Vec::with_capacity(features.len());
        for &feature in features {
            outcomes.push(
                self.set_feature_state(executor, notifier, attached, feature, desired)
                    .await,
            );
        }
        outcomes
    }

    /// True iff every member is believed enabled; false for an empty group.
    pub fn is_group_active(&self, features: &[&'static Feature]) -> bool {
        !features.is_empty() && features.iter().all(|f| self.is_enabled(f.id))
    }

    /// Enable Super Run (once) and write `speed`.
    pub async fn apply_super_run<E: OperationExecutor>(
        &mut self,
        executor: &E,
        notifier: &mut NotificationCenter,
        attached: bool,
        speed: f32,
    ) -> bool {
        if !attached {
            return false;
        }
        if !self.super_run_enabled {
            self.super_run_enabled = true;
            if let Err(e) = executor.apply(&SUPER_RUN_PATCH, true).await {
                self.super_run_enabled = false;
                return self.super_run_failed(notifier, e);
            }
        }
        let speed_op = Operation::FloatSet {
            offset: RUN_SPEED_OFFSET,
            value: speed,
        };
        if let Err(e) = executor.apply(&speed_op, true).await {
            return self.super_run_failed(notifier, e);
        }
        logging::log("TOGGLE", &format!("Super Run speed {}", speed));
        true
    }

    /// Disable Super Run and put the default run speed back.
    pub async fn reset_super_run<E: OperationExecutor>(
        &mut self,
        executor: &E,
        notifier: &mut NotificationCenter,
        attached: bool,
    ) -> bool {
        if !attached {
            return false;
        }
        self.super_run_enabled = false;
        if let Err(e) = executor.apply(&SUPER_RUN_PATCH, false).await {
            return self.super_run_failed(notifier, e);
        }
        let speed_op = Operation::FloatSet {
            offset: RUN_SPEED_OFFSET,
            value: DEFAULT_RUN_SPEED,
        };
        if let Err(e) = executor.apply(&speed_op, true).await {
            return self.super_run_failed(notifier, e);
        }
        logging::log("TOGGLE", "Super Run reset");
        true
    }

    fn super_run_failed(&self, notifier: &mut NotificationCenter, error: ExecutorError) -> bool {
        warn!(category = "TOGGLE", error = %error, "Super Run failed");
        notifier.report(&ModextError::from(error));
        false
    }
}

#[cfg(test)]
#[path = "toggles_tests.rs"]
mod tests;
