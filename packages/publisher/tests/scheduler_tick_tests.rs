//! Generate/publish ticks and the low-queue alerter.

mod common;

use crate::common::{init_tracing, seed_numbered, seed_titles};
use publisher_core::domains::queue::actions::{
    check_low_queue, generate_tick, publish_item, publish_tick, AlertOutcome, PublishOutcome,
    TickOutcome, LOW_QUEUE_THRESHOLD,
};
use publisher_core::domains::queue::models::QueueStatus;
use publisher_core::kernel::test_dependencies::{MockGenerator, RecordingNotifier};
use publisher_core::kernel::TestDependencies;

// ============================================================================
// Generate tick
// ============================================================================

#[tokio::test]
async fn generate_tick_takes_only_the_oldest_pending_item() {
    init_tracing();
    let test_deps = TestDependencies::new();
    let queue = test_deps.queue.clone();
    let deps = test_deps.into_deps();
    seed_titles(&deps, &["A", "B", "C"]).await;

    let report = generate_tick(&deps).await.unwrap();

    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].title, "A");
    assert!(matches!(
        report.entries[0].outcome,
        TickOutcome::Generated { .. }
    ));

    let statuses: Vec<_> = queue.items().iter().map(|i| i.status).collect();
    assert_eq!(
        statuses,
        vec![
            QueueStatus::Generated,
            QueueStatus::Pending,
            QueueStatus::Pending
        ]
    );
    assert_eq!(report.pending_remaining, Some(2));
}

#[tokio::test]
async fn generate_tick_on_empty_queue_does_nothing() {
    let test_deps = TestDependencies::new();
    let notifier = test_deps.notifier.clone();
    let deps = test_deps.into_deps();

    let report = generate_tick(&deps).await.unwrap();

    assert!(report.is_empty());
    assert_eq!(report.pending_remaining, Some(0));
    assert_eq!(report.low_queue_alert, Some(AlertOutcome::NotNeeded));
    assert!(notifier.alerts().is_empty());
}

#[tokio::test]
async fn generate_tick_retries_oldest_failed_item_alongside_pending() {
    let test_deps = TestDependencies::new();
    let queue = test_deps.queue.clone();
    let deps = test_deps.into_deps();
    let items = seed_titles(&deps, &["Broken", "Fresh"]).await;

    let mut broken = items[0].clone();
    broken.status = QueueStatus::Failed;
    broken.error_msg = Some("timeout".into());
    queue.put(broken);

    let report = generate_tick(&deps).await.unwrap();

    let titles: Vec<_> = report.entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Fresh", "Broken"]);
    assert!(queue
        .items()
        .iter()
        .all(|i| i.status == QueueStatus::Generated));
}

#[tokio::test]
async fn failed_retry_is_reported_without_hiding_the_pending_result() {
    // First call (pending item) succeeds, second (failed item) errors again
    let generator = MockGenerator::new()
        .with_post(publisher_core::kernel::test_dependencies::sample_post("Fresh"))
        .with_error("still broken");
    let test_deps = TestDependencies::new().mock_generator(generator);
    let queue = test_deps.queue.clone();
    let deps = test_deps.into_deps();
    let items = seed_titles(&deps, &["Broken", "Fresh"]).await;

    let mut broken = items[0].clone();
    broken.status = QueueStatus::Failed;
    queue.put(broken);

    let report = generate_tick(&deps).await.unwrap();

    assert_eq!(report.entries.len(), 2);
    assert!(matches!(
        report.entries[0].outcome,
        TickOutcome::Generated { .. }
    ));
    assert_eq!(
        report.entries[1].outcome,
        TickOutcome::Failed {
            error: "still broken".into()
        }
    );

    let broken = queue
        .items()
        .into_iter()
        .find(|i| i.title == "Broken")
        .unwrap();
    assert_eq!(broken.status, QueueStatus::Failed);
    assert_eq!(broken.error_msg.as_deref(), Some("still broken"));
}

#[tokio::test]
async fn item_failing_in_a_tick_is_not_retried_until_the_next_tick() {
    let generator = MockGenerator::new().with_error("first attempt fails");
    let test_deps = TestDependencies::new().mock_generator(generator);
    let generator = test_deps.generator.clone();
    let queue = test_deps.queue.clone();
    let deps = test_deps.into_deps();
    seed_titles(&deps, &["Only"]).await;

    let first = generate_tick(&deps).await.unwrap();
    assert_eq!(first.entries.len(), 1);
    assert_eq!(generator.call_count(), 1);
    assert_eq!(queue.items()[0].status, QueueStatus::Failed);

    let second = generate_tick(&deps).await.unwrap();
    assert_eq!(second.entries.len(), 1);
    assert_eq!(generator.call_count(), 2);
    assert_eq!(queue.items()[0].status, QueueStatus::Generated);
}

// ============================================================================
// Low-queue alerter
// ============================================================================

#[tokio::test]
async fn no_alert_above_the_threshold() {
    let test_deps = TestDependencies::new();
    let notifier = test_deps.notifier.clone();
    let deps = test_deps.into_deps();
    seed_numbered(&deps, (LOW_QUEUE_THRESHOLD + 1) as usize).await;

    let check = check_low_queue(&deps).await;

    assert_eq!(check.pending, Some(LOW_QUEUE_THRESHOLD + 1));
    assert_eq!(check.alert, AlertOutcome::NotNeeded);
    assert!(notifier.alerts().is_empty());
}

#[tokio::test]
async fn alert_at_the_threshold_lists_pending_titles_in_order() {
    let test_deps = TestDependencies::new();
    let notifier = test_deps.notifier.clone();
    let deps = test_deps.into_deps();
    seed_numbered(&deps, LOW_QUEUE_THRESHOLD as usize).await;

    let check = check_low_queue(&deps).await;

    assert_eq!(check.alert, AlertOutcome::Sent { titles: 10 });
    let alerts = notifier.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].first().map(String::as_str), Some("Title 01"));
    assert_eq!(alerts[0].last().map(String::as_str), Some("Title 10"));
}

#[tokio::test]
async fn unchanged_queue_at_the_threshold_alerts_on_every_check() {
    let test_deps = TestDependencies::new();
    let notifier = test_deps.notifier.clone();
    let deps = test_deps.into_deps();
    seed_numbered(&deps, LOW_QUEUE_THRESHOLD as usize).await;

    let first = check_low_queue(&deps).await;
    let second = check_low_queue(&deps).await;

    assert_eq!(first.alert, AlertOutcome::Sent { titles: 10 });
    assert_eq!(second.alert, AlertOutcome::Sent { titles: 10 });
    assert_eq!(second.pending, Some(LOW_QUEUE_THRESHOLD));

    let alerts = notifier.alerts();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0], alerts[1]);
    assert_eq!(alerts[1].len(), 10);
}

#[tokio::test]
async fn tick_that_drops_queue_to_threshold_alerts_and_keeps_alerting() {
    let test_deps = TestDependencies::new();
    let notifier = test_deps.notifier.clone();
    let deps = test_deps.into_deps();
    seed_numbered(&deps, (LOW_QUEUE_THRESHOLD + 1) as usize).await;

    let first = generate_tick(&deps).await.unwrap();
    assert_eq!(first.pending_remaining, Some(LOW_QUEUE_THRESHOLD));
    assert_eq!(
        first.low_queue_alert,
        Some(AlertOutcome::Sent { titles: 10 })
    );

    let second = generate_tick(&deps).await.unwrap();
    assert_eq!(
        second.low_queue_alert,
        Some(AlertOutcome::Sent { titles: 9 })
    );

    let alerts = notifier.alerts();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0][0], "Title 02");
    assert_eq!(alerts[1][0], "Title 03");
}

#[tokio::test]
async fn failing_notifier_does_not_fail_the_tick() {
    let test_deps = TestDependencies::new().mock_notifier(RecordingNotifier::failing());
    let queue = test_deps.queue.clone();
    let deps = test_deps.into_deps();
    seed_titles(&deps, &["A", "B"]).await;

    let report = generate_tick(&deps).await.unwrap();

    assert!(matches!(
        report.low_queue_alert,
        Some(AlertOutcome::Failed { .. })
    ));
    assert_eq!(queue.items()[0].status, QueueStatus::Generated);
}

// ============================================================================
// Publish
// ============================================================================

#[tokio::test]
async fn publish_tick_promotes_the_oldest_generated_item() {
    let test_deps = TestDependencies::new();
    let queue = test_deps.queue.clone();
    let posts = test_deps.posts.clone();
    let deps = test_deps.into_deps();
    seed_titles(&deps, &["First", "Second"]).await;
    generate_tick(&deps).await.unwrap();
    generate_tick(&deps).await.unwrap();

    let report = publish_tick(&deps).await.unwrap();

    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].title, "First");
    let first = &queue.items()[0];
    assert_eq!(first.status, QueueStatus::Published);
    assert!(matches!(
        report.entries[0].outcome,
        TickOutcome::Published { post_id } if Some(post_id) == first.post_id
    ));

    let published: Vec<_> = posts.posts().into_iter().filter(|p| p.published).collect();
    assert_eq!(published.len(), 1);
    assert!(published[0].published_at.is_some());
    assert_eq!(queue.items()[1].status, QueueStatus::Generated);
}

#[tokio::test]
async fn publish_tick_with_nothing_generated_is_a_no_op() {
    let deps = TestDependencies::new().into_deps();
    seed_titles(&deps, &["Still pending"]).await;

    let report = publish_tick(&deps).await.unwrap();

    assert!(report.is_empty());
}

#[tokio::test]
async fn publishing_twice_keeps_the_first_timestamp() {
    let test_deps = TestDependencies::new();
    let posts = test_deps.posts.clone();
    let deps = test_deps.into_deps();
    let items = seed_titles(&deps, &["Once"]).await;
    generate_tick(&deps).await.unwrap();

    let first = publish_item(items[0].id, &deps).await.unwrap();
    let PublishOutcome::Published { post, .. } = first else {
        panic!("expected a publish");
    };
    let stamped = post.published_at;

    let second = publish_item(items[0].id, &deps).await.unwrap();
    assert!(matches!(second, PublishOutcome::NothingToPublish { .. }));
    assert_eq!(posts.posts()[0].published_at, stamped);
}

#[tokio::test]
async fn failed_promotion_leaves_post_and_item_untouched() {
    let test_deps = TestDependencies::new();
    let queue = test_deps.queue.clone();
    let posts = test_deps.posts.clone();
    let deps = test_deps.into_deps();
    let items = seed_titles(&deps, &["Held Back"]).await;
    generate_tick(&deps).await.unwrap();
    queue.fail_writes_to(QueueStatus::Published);

    let result = publish_item(items[0].id, &deps).await;

    assert!(matches!(
        result,
        Err(publisher_core::common::PipelineError::Store(_))
    ));
    assert_eq!(queue.items()[0].status, QueueStatus::Generated);
    assert!(!posts.posts()[0].published);
    assert!(posts.posts()[0].published_at.is_none());

    queue.clear_write_failures();
    let retried = publish_item(items[0].id, &deps).await.unwrap();
    assert!(matches!(retried, PublishOutcome::Published { .. }));
    assert_eq!(queue.items()[0].status, QueueStatus::Published);
    assert!(posts.posts()[0].published);
}

#[tokio::test]
async fn missing_post_is_reported_as_nothing_to_publish() {
    let test_deps = TestDependencies::new();
    let queue = test_deps.queue.clone();
    let posts = test_deps.posts.clone();
    let deps = test_deps.into_deps();
    seed_titles(&deps, &["Orphan"]).await;
    generate_tick(&deps).await.unwrap();
    let post_id = queue.items()[0].post_id.unwrap();
    posts.remove(post_id);

    let report = publish_tick(&deps).await.unwrap();

    assert!(matches!(
        report.entries[0].outcome,
        TickOutcome::Skipped { .. }
    ));
    assert_eq!(queue.items()[0].status, QueueStatus::Generated);
}

#[tokio::test]
async fn pending_item_cannot_be_published() {
    let deps = TestDependencies::new().into_deps();
    let items = seed_titles(&deps, &["Too early"]).await;

    let result = publish_item(items[0].id, &deps).await;

    assert!(matches!(
        result,
        Err(publisher_core::common::PipelineError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn generator_is_not_called_by_the_publish_tick() {
    let test_deps = TestDependencies::new();
    let generator = test_deps.generator.clone();
    let deps = test_deps.into_deps();
    seed_titles(&deps, &["A"]).await;

    publish_tick(&deps).await.unwrap();

    assert_eq!(generator.call_count(), 0);
}
