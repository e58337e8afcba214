use super::*;
use crate::features::{self, FeatureGroup};
use crate::notifications::ToastVariant;
use crate::target::{ProcessSession, SimulatedTarget};

static TRIPLE: Feature = Feature {
    id: "triple",
    label: "Triple",
    description: "Three operations in a fixed order",
    group: FeatureGroup::Player,
    operations: &[
        Operation::Patch {
            offset: 0x100,
            bytes: &[0x01],
        },
        Operation::Nop {
            offset: 0x200,
            size: 2,
        },
        Operation::FloatSet {
            offset: 0x300,
            value: 1.5,
        },
    ],
};

fn feature(id: &str) -> &'static Feature {
    features::find(id).unwrap()
}

async fn attached_target() -> SimulatedTarget {
    let target = SimulatedTarget::new();
    target.attach().await.unwrap();
    target
}

#[tokio::test]
async fn test_enable_applies_operations_in_declared_order() {
    let target = attached_target().await;
    let mut notifier = NotificationCenter::new();
    let mut toggles = ToggleReconciler::new();

    let outcome = toggles
        .set_feature_state(&target, &mut notifier, true, &TRIPLE, true)
        .await;

    assert_eq!(outcome, ToggleOutcome::Applied);
    assert!(toggles.is_enabled("triple"));
    let journal = target.journal();
    let offsets: Vec<usize> = journal.iter().map(|op| op.offset).collect();
    assert_eq!(offsets, vec![0x100, 0x200, 0x300]);
    assert!(journal.iter().all(|op| op.enabled && op.ok));
    assert_eq!(notifier.pushed_count(), 0);
}

#[tokio::test]
async fn test_failure_at_any_position_reverts_and_notifies_once() {
    for (k, offset) in [0x100usize, 0x200, 0x300].into_iter().enumerate() {
        let target = attached_target().await;
        target.fail_at(offset);
        let mut notifier = NotificationCenter::new();
        let mut toggles = ToggleReconciler::new();

        let outcome = toggles
            .set_feature_state(&target, &mut notifier, true, &TRIPLE, true)
            .await;

        assert!(
            matches!(outcome, ToggleOutcome::Reverted { failed_at, .. } if failed_at == k),
            "k={k}: {outcome:?}"
        );
        assert!(!toggles.is_enabled("triple"));
        assert_eq!(notifier.pushed_count(), 1);
        assert_eq!(notifier.count(ToastVariant::Error), 1);
        // Nothing issued after the failing operation
        assert_eq!(target.journal().len(), k + 1);
    }
}

#[tokio::test]
async fn test_failed_disable_restores_enabled_belief() {
    let target = attached_target().await;
    let mut notifier = NotificationCenter::new();
    let mut toggles = ToggleReconciler::new();
    toggles
        .set_feature_state(&target, &mut notifier, true, &TRIPLE, true)
        .await;

    target.fail_at(0x200);
    let outcome = toggles
        .set_feature_state(&target, &mut notifier, true, &TRIPLE, false)
        .await;

    assert!(matches!(outcome, ToggleOutcome::Reverted { failed_at: 1, .. }));
    assert!(toggles.is_enabled("triple"));
    // The first operation stays restored; no compensation
    assert_eq!(target.bytes_at(0x100, 1), vec![0xCC]);
}

#[tokio::test]
async fn test_setting_current_belief_issues_no_calls() {
    let target = attached_target().await;
    let mut notifier = NotificationCenter::new();
    let mut toggles = ToggleReconciler::new();

    let outcome = toggles
        .set_feature_state(&target, &mut notifier, true, feature("godmode"), false)
        .await;
    assert_eq!(outcome, ToggleOutcome::Skipped(SkipReason::Unchanged));

    toggles
        .set_feature_state(&target, &mut notifier, true, feature("godmode"), true)
        .await;
    target.clear_journal();
    let outcome = toggles
        .set_feature_state(&target, &mut notifier, true, feature("godmode"), true)
        .await;
    assert_eq!(outcome, ToggleOutcome::Skipped(SkipReason::Unchanged));
    assert!(target.journal().is_empty());
}

#[tokio::test]
async fn test_detached_toggle_is_noop() {
    let target = SimulatedTarget::new();
    let mut notifier = NotificationCenter::new();
    let mut toggles = ToggleReconciler::new();

    let outcome = toggles
        .set_feature_state(&target, &mut notifier, false, feature("godmode"), true)
        .await;

    assert_eq!(outcome, ToggleOutcome::Skipped(SkipReason::NotAttached));
    assert!(target.journal().is_empty());
    assert!(!toggles.is_enabled("godmode"));
}

#[tokio::test]
async fn test_toggle_feature_flips_belief() {
    let target = attached_target().await;
    let mut notifier = NotificationCenter::new();
    let mut toggles = ToggleReconciler::new();

    toggles
        .toggle_feature(&target, &mut notifier, true, feature("anti-afk"))
        .await;
    assert!(toggles.is_enabled("anti-afk"));
    toggles
        .toggle_feature(&target, &mut notifier, true, feature("anti-afk"))
        .await;
    assert!(!toggles.is_enabled("anti-afk"));
}

#[tokio::test]
async fn test_mixed_group_turns_everything_on() {
    let target = attached_target().await;
    let mut notifier = NotificationCenter::new();
    let mut toggles = ToggleReconciler::new();
    let a = feature("godmode");
    let b = feature("infinite-energy");

    toggles
        .set_feature_state(&target, &mut notifier, true, b, true)
        .await;
    target.clear_journal();

    let outcomes = toggles
        .toggle_group(&target, &mut notifier, true, &[a, b])
        .await;

    assert_eq!(
        outcomes,
        vec![
            ToggleOutcome::Applied,
            ToggleOutcome::Skipped(SkipReason::Unchanged)
        ]
    );
    assert!(toggles.is_enabled("godmode"));
    assert!(toggles.is_enabled("infinite-energy"));
    // Only A touched the executor
    let offsets: Vec<usize> = target.journal().iter().map(|op| op.offset).collect();
    assert_eq!(offsets, vec![0x2FF40E2]);
}

#[tokio::test]
async fn test_fully_active_group_turns_off() {
    let target = attached_target().await;
    let mut notifier = NotificationCenter::new();
    let mut toggles = ToggleReconciler::new();
    let camera = features::group(FeatureGroup::Camera);

    toggles
        .toggle_group(&target, &mut notifier, true, &camera)
        .await;
    assert!(toggles.is_group_active(&camera));

    toggles
        .toggle_group(&target, &mut notifier, true, &camera)
        .await;
    assert!(camera.iter().all(|f| !toggles.is_enabled(f.id)));
}

#[tokio::test]
async fn test_group_member_failure_does_not_block_later_members() {
    let target = attached_target().await;
    target.fail_at(0x2FF40E2);
    let mut notifier = NotificationCenter::new();
    let mut toggles = ToggleReconciler::new();
    let player = features::group(FeatureGroup::Player);

    let outcomes = toggles
        .toggle_group(&target, &mut notifier, true, &player)
        .await;

    assert!(matches!(outcomes[0], ToggleOutcome::Reverted { .. }));
    assert!(outcomes[1..].iter().all(|o| *o == ToggleOutcome::Applied));
    assert!(!toggles.is_enabled("godmode"));
    assert!(toggles.is_enabled("anti-afk"));
    assert_eq!(notifier.pushed_count(), 1);
}

#[tokio::test]
async fn test_is_group_active() {
    let target = attached_target().await;
    let mut notifier = NotificationCenter::new();
    let mut toggles = ToggleReconciler::new();
    let a = feature("super-jump");
    let b = feature("super-swim");

    toggles
        .set_feature_state(&target, &mut notifier, true, a, true)
        .await;
    assert!(!toggles.is_group_active(&[a, b]));

    toggles
        .set_feature_state(&target, &mut notifier, true, b, true)
        .await;
    assert!(toggles.is_group_active(&[a, b]));
    assert!(!toggles.is_group_active(&[]));
}

#[tokio::test]
async fn test_super_run_apply_and_reset() {
    let target = attached_target().await;
    let mut notifier = NotificationCenter::new();
    let mut toggles = ToggleReconciler::new();

    assert!(
        toggles
            .apply_super_run(&target, &mut notifier, true, 12.0)
            .await
    );
    assert!(toggles.super_run_enabled());
    assert_eq!(toggles.active_count(), 1);
    assert_eq!(target.bytes_at(0x27BD818, 1), vec![0x00]);
    assert_eq!(target.bytes_at(RUN_SPEED_OFFSET, 4), 12.0f32.to_le_bytes().to_vec());

    // Second apply only rewrites the speed
    target.clear_journal();
    toggles
        .apply_super_run(&target, &mut notifier, true, 15.0)
        .await;
    let offsets: Vec<usize> = target.journal().iter().map(|op| op.offset).collect();
    assert_eq!(offsets, vec![RUN_SPEED_OFFSET]);

    assert!(toggles.reset_super_run(&target, &mut notifier, true).await);
    assert!(!toggles.super_run_enabled());
    assert_eq!(target.bytes_at(0x27BD818, 1), vec![0xCC]);
    assert_eq!(target.bytes_at(RUN_SPEED_OFFSET, 4), 3.5f32.to_le_bytes().to_vec());
}

#[tokio::test]
async fn test_super_run_failure_notifies_once() {
    let target = attached_target().await;
    target.fail_at(RUN_SPEED_OFFSET);
    let mut notifier = NotificationCenter::new();
    let mut toggles = ToggleReconciler::new();

    assert!(
        !toggles
            .apply_super_run(&target, &mut notifier, true, 12.0)
            .await
    );
    assert_eq!(notifier.pushed_count(), 1);
}

#[tokio::test]
async fn test_clear_forgets_beliefs_and_super_run() {
    let target = attached_target().await;
    let mut notifier = NotificationCenter::new();
    let mut toggles = ToggleReconciler::new();
    toggles
        .set_feature_state(&target, &mut notifier, true, feature("godmode"), true)
        .await;
    toggles
        .apply_super_run(&target, &mut notifier, true, 10.0)
        .await;
    assert_eq!(toggles.active_count(), 2);
    assert_eq!(toggles.enabled_ids(), vec!["godmode"]);

    toggles.clear();
    assert_eq!(toggles.active_count(), 0);
}
