//! Integration tests for the timer lifecycle manager
//!
//! Every test runs on a paused tokio clock, so sleeping N seconds drives
//! exactly N countdown ticks.

use std::{sync::Arc, time::Duration};

use countdown_keeper::{
    error::ManagerError,
    manager::{BulkAction, NoticeKind, TickOutcome, TimerManager},
    notifications::{LocalNotifier, NotificationGateway},
    state::{Timer, TimerDraft, TimerStatus},
    storage::{KeyValueStore, MemoryStore, StorageGateway},
};
use tokio::time::sleep;

struct Harness {
    store: Arc<MemoryStore>,
    notifier: Arc<LocalNotifier>,
    manager: TimerManager,
}

async fn harness_with(store: Arc<MemoryStore>, notifications_allowed: bool) -> Harness {
    let notifier = Arc::new(LocalNotifier::new(notifications_allowed));
    let mut notifications = NotificationGateway::new(notifier.clone());
    notifications.request_permission().await;
    let manager = TimerManager::new(StorageGateway::new(store.clone()), notifications);
    Harness {
        store,
        notifier,
        manager,
    }
}

async fn harness() -> Harness {
    harness_with(Arc::new(MemoryStore::new()), true).await
}

/// Sleep through `secs` ticks, landing half a period past the last one
async fn advance(secs: u64) {
    sleep(Duration::from_millis(secs * 1000 + 500)).await;
}

async fn create(manager: &TimerManager, name: &str, secs: u64, category: &str) -> Timer {
    manager
        .create_timer(&TimerDraft::new(name, secs.to_string()).category(category))
        .await
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn focus_timer_runs_to_completion_with_one_halfway_notice() {
    let h = harness().await;
    let mut notices = h.manager.subscribe_notices();
    let mut delivered = h.notifier.subscribe();

    let timer = h
        .manager
        .create_timer(
            &TimerDraft::new("Focus", "120")
                .category("Study")
                .halfway_alert(true),
        )
        .await
        .unwrap();
    assert!(h.manager.start(&timer.id).await.unwrap());
    assert_eq!(h.notifier.pending_count(), 2);

    advance(60).await;

    let running = h.manager.timer(&timer.id).await.unwrap();
    assert_eq!(running.remaining_time, 60);
    assert_eq!(running.status, TimerStatus::Running);

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.kind, NoticeKind::Halfway);
    assert_eq!(notice.timer_id, timer.id);
    assert_eq!(notice.message, "🔔 Focus is halfway done! 1:00 remaining");
    assert!(notices.try_recv().is_err());

    sleep(Duration::from_secs(60)).await;

    assert!(h.manager.timer(&timer.id).await.is_none());
    assert!(!h.manager.is_counting_down(&timer.id).await);

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.kind, NoticeKind::Completed);
    assert_eq!(notice.message, "🎉 Focus completed!");
    assert!(notices.try_recv().is_err());

    let history = h.manager.storage().load_history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].name, "Focus");
    assert_eq!(history[0].category, "Study");
    assert_eq!(history[0].original_duration, 120);
    assert_ne!(history[0].id, timer.id);

    // Both local notifications fired at their scheduled instants
    assert_eq!(delivered.try_recv().unwrap().title, "Halfway Alert!");
    assert_eq!(delivered.try_recv().unwrap().title, "Timer Completed!");
    assert_eq!(h.notifier.pending_count(), 0);

    // Completed timers are never persisted as active
    assert!(h.manager.storage().load_timers().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn every_tick_is_persisted_and_published() {
    let h = harness().await;
    let timer = create(&h.manager, "Plank", 30, "Workout").await;
    let observer = h.manager.subscribe_timers();

    h.manager.start(&timer.id).await.unwrap();
    advance(5).await;

    let persisted = h.manager.storage().load_timers().await;
    assert_eq!(persisted[0].remaining_time, 25);
    assert_eq!(persisted[0].status, TimerStatus::Running);
    assert_eq!(observer.borrow()[0].remaining_time, 25);
}

#[tokio::test(start_paused = true)]
async fn start_then_pause_keeps_remaining_time() {
    let h = harness().await;
    let timer = create(&h.manager, "Tea", 90, "Break").await;

    h.manager.start(&timer.id).await.unwrap();
    assert!(h.manager.pause(&timer.id).await.unwrap());

    let paused = h.manager.timer(&timer.id).await.unwrap();
    assert_eq!(paused.status, TimerStatus::Paused);
    assert_eq!(paused.remaining_time, 90);
    assert!(!h.manager.is_counting_down(&timer.id).await);
    assert_eq!(h.notifier.pending_count(), 0);

    advance(10).await;
    assert_eq!(h.manager.timer(&timer.id).await.unwrap().remaining_time, 90);
}

#[tokio::test(start_paused = true)]
async fn pause_is_idempotent() {
    let h = harness().await;
    let timer = create(&h.manager, "Tea", 90, "Break").await;

    h.manager.start(&timer.id).await.unwrap();
    advance(3).await;

    assert!(h.manager.pause(&timer.id).await.unwrap());
    let once = h.manager.timers().await;
    assert!(!h.manager.pause(&timer.id).await.unwrap());
    let twice = h.manager.timers().await;

    assert_eq!(once, twice);
    assert_eq!(twice[0].remaining_time, 87);
}

#[tokio::test(start_paused = true)]
async fn paused_timer_resumes_where_it_stopped() {
    let h = harness().await;
    let timer = create(&h.manager, "Read", 20, "Study").await;

    h.manager.start(&timer.id).await.unwrap();
    advance(5).await;
    h.manager.pause(&timer.id).await.unwrap();
    advance(5).await;
    h.manager.start(&timer.id).await.unwrap();
    advance(5).await;

    assert_eq!(h.manager.timer(&timer.id).await.unwrap().remaining_time, 10);
}

#[tokio::test(start_paused = true)]
async fn reset_restores_duration_from_any_status() {
    let h = harness().await;
    let stopped = create(&h.manager, "A", 40, "Study").await;
    let running = create(&h.manager, "B", 40, "Study").await;
    let paused = create(&h.manager, "C", 40, "Study").await;

    h.manager.start(&running.id).await.unwrap();
    h.manager.start(&paused.id).await.unwrap();
    advance(4).await;
    h.manager.pause(&paused.id).await.unwrap();

    for id in [&stopped.id, &running.id, &paused.id] {
        assert!(h.manager.reset(id).await.unwrap());
        let timer = h.manager.timer(id).await.unwrap();
        assert_eq!(timer.status, TimerStatus::Stopped);
        assert_eq!(timer.remaining_time, timer.original_duration);
        assert!(!h.manager.is_counting_down(id).await);
    }

    advance(5).await;
    assert!(h
        .manager
        .timers()
        .await
        .iter()
        .all(|t| t.remaining_time == 40));
}

#[tokio::test(start_paused = true)]
async fn deleting_a_running_timer_records_nothing() {
    let h = harness().await;
    let timer = create(&h.manager, "Nap", 10, "Break").await;

    h.manager.start(&timer.id).await.unwrap();
    advance(3).await;
    assert!(h.manager.delete(&timer.id).await.unwrap());

    assert_eq!(h.notifier.pending_count(), 0);
    advance(20).await;

    assert!(h.manager.timers().await.is_empty());
    assert!(h.manager.storage().load_history().await.is_empty());
    assert_eq!(h.manager.active_countdowns().await, 0);

    // A late tick for the deleted id is inert
    assert_eq!(h.manager.tick(&timer.id, 1).await, TickOutcome::Finished);
    assert!(h.manager.timers().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn tick_from_a_superseded_run_is_discarded() {
    let h = harness().await;
    let timer = create(&h.manager, "Run", 60, "Workout").await;

    h.manager.start(&timer.id).await.unwrap();
    h.manager.pause(&timer.id).await.unwrap();
    h.manager.start(&timer.id).await.unwrap();

    // Run 1 was replaced by run 2
    assert_eq!(h.manager.tick(&timer.id, 1).await, TickOutcome::Finished);
    assert_eq!(h.manager.timer(&timer.id).await.unwrap().remaining_time, 60);

    advance(2).await;
    assert_eq!(h.manager.timer(&timer.id).await.unwrap().remaining_time, 58);
}

#[tokio::test(start_paused = true)]
async fn unknown_ids_are_no_ops() {
    let h = harness().await;
    create(&h.manager, "Run", 60, "Workout").await;
    let before = h.manager.timers().await;

    assert!(!h.manager.start("missing").await.unwrap());
    assert!(!h.manager.pause("missing").await.unwrap());
    assert!(!h.manager.reset("missing").await.unwrap());
    assert!(!h.manager.delete("missing").await.unwrap());

    assert_eq!(h.manager.timers().await, before);
}

#[tokio::test(start_paused = true)]
async fn starting_a_running_timer_keeps_a_single_countdown() {
    let h = harness().await;
    let timer = create(&h.manager, "Run", 60, "Workout").await;

    assert!(h.manager.start(&timer.id).await.unwrap());
    assert!(!h.manager.start(&timer.id).await.unwrap());
    advance(5).await;

    assert_eq!(h.manager.active_countdowns().await, 1);
    assert_eq!(h.manager.timer(&timer.id).await.unwrap().remaining_time, 55);
}

#[tokio::test(start_paused = true)]
async fn concurrent_timers_count_down_independently() {
    let h = harness().await;
    let short = create(&h.manager, "Short", 3, "Break").await;
    let long = create(&h.manager, "Long", 10, "Study").await;

    h.manager.start(&short.id).await.unwrap();
    advance(1).await;
    h.manager.start(&long.id).await.unwrap();
    advance(4).await;

    assert!(h.manager.timer(&short.id).await.is_none());
    assert_eq!(h.manager.timer(&long.id).await.unwrap().remaining_time, 6);
    assert_eq!(h.manager.storage().load_history().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn bulk_start_skips_running_timers() {
    let h = harness().await;
    let running = create(&h.manager, "A1", 60, "A").await;
    let stopped = create(&h.manager, "A2", 60, "A").await;
    let other = create(&h.manager, "B1", 60, "B").await;

    h.manager.start(&running.id).await.unwrap();
    advance(5).await;

    let affected = h.manager.bulk_action("A", BulkAction::Start).await.unwrap();
    assert_eq!(affected, 1);
    // Offset so neither countdown is due exactly when we wake
    sleep(Duration::from_millis(2250)).await;

    assert_eq!(h.manager.timer(&running.id).await.unwrap().remaining_time, 53);
    assert_eq!(h.manager.timer(&stopped.id).await.unwrap().remaining_time, 58);
    assert_eq!(
        h.manager.timer(&other.id).await.unwrap().status,
        TimerStatus::Stopped
    );
    assert_eq!(h.manager.active_countdowns().await, 2);
}

#[tokio::test(start_paused = true)]
async fn bulk_pause_only_touches_running_timers() {
    let h = harness().await;
    let running = create(&h.manager, "A1", 60, "A").await;
    let stopped = create(&h.manager, "A2", 60, "A").await;
    let elsewhere = create(&h.manager, "B1", 60, "B").await;

    h.manager.start(&running.id).await.unwrap();
    h.manager.start(&elsewhere.id).await.unwrap();
    advance(2).await;

    let affected = h.manager.bulk_action("A", BulkAction::Pause).await.unwrap();
    assert_eq!(affected, 1);

    assert_eq!(
        h.manager.timer(&running.id).await.unwrap().status,
        TimerStatus::Paused
    );
    assert_eq!(
        h.manager.timer(&stopped.id).await.unwrap().status,
        TimerStatus::Stopped
    );
    assert_eq!(
        h.manager.timer(&elsewhere.id).await.unwrap().status,
        TimerStatus::Running
    );
}

#[tokio::test(start_paused = true)]
async fn bulk_reset_resets_whole_category() {
    let h = harness().await;
    let a1 = create(&h.manager, "A1", 30, "A").await;
    let a2 = create(&h.manager, "A2", 30, "A").await;

    h.manager.start(&a1.id).await.unwrap();
    h.manager.start(&a2.id).await.unwrap();
    advance(3).await;
    h.manager.pause(&a2.id).await.unwrap();

    let affected = h.manager.bulk_action("A", BulkAction::Reset).await.unwrap();
    assert_eq!(affected, 2);
    assert!(h
        .manager
        .timers()
        .await
        .iter()
        .all(|t| t.status == TimerStatus::Stopped && t.remaining_time == 30));
    assert_eq!(h.manager.active_countdowns().await, 0);
}

#[tokio::test(start_paused = true)]
async fn restart_resumes_running_timers_from_persisted_time() {
    let store = Arc::new(MemoryStore::new());

    let mut running = Timer::new("Bake".into(), "Other".into(), 600, false);
    running.status = TimerStatus::Running;
    running.remaining_time = 10;
    let mut paused = Timer::new("Stretch".into(), "Workout".into(), 60, false);
    paused.status = TimerStatus::Paused;
    paused.remaining_time = 30;
    StorageGateway::new(store.clone())
        .save_timers(&[running.clone(), paused.clone()])
        .await
        .unwrap();

    let h = harness_with(store, true).await;
    assert_eq!(h.manager.load().await, 1);
    assert!(h.manager.is_counting_down(&running.id).await);
    assert!(!h.manager.is_counting_down(&paused.id).await);
    assert_eq!(h.notifier.pending_count(), 1);

    advance(3).await;
    assert_eq!(h.manager.timer(&running.id).await.unwrap().remaining_time, 7);
    assert_eq!(h.manager.timer(&paused.id).await.unwrap().remaining_time, 30);
}

#[tokio::test(start_paused = true)]
async fn restart_cancels_notifications_of_timers_no_longer_running() {
    let h = harness().await;
    let mut delivered = h.notifier.subscribe();
    let timer = create(&h.manager, "Tea", 5, "Break").await;
    h.manager.start(&timer.id).await.unwrap();
    assert_eq!(h.notifier.pending_count(), 1);

    let mut snapshot = h.manager.timers().await;
    snapshot[0].status = TimerStatus::Paused;
    assert_eq!(h.manager.restart_running_timers(snapshot).await, 0);

    assert_eq!(h.manager.active_countdowns().await, 0);
    assert_eq!(h.notifier.pending_count(), 0);

    sleep(Duration::from_secs(6)).await;
    assert!(delivered.try_recv().is_err());
    assert_eq!(h.manager.timer(&timer.id).await.unwrap().status, TimerStatus::Paused);
}

#[tokio::test(start_paused = true)]
async fn clearing_history_after_completion_stays_cleared() {
    let h = harness().await;
    let timer = create(&h.manager, "Quick", 2, "Break").await;
    h.manager.start(&timer.id).await.unwrap();

    advance(2).await;
    assert_eq!(h.manager.storage().load_history().await.len(), 1);

    h.manager.clear_history().await.unwrap();
    advance(2).await;
    assert!(h.manager.storage().load_history().await.is_empty());
    assert!(h.store.get("timerHistory").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn persistence_failure_is_reported_without_rollback() {
    let h = harness().await;
    let failing = create(&h.manager, "Fail", 30, "A").await;
    let other = create(&h.manager, "Other", 30, "A").await;
    h.manager.start(&other.id).await.unwrap();

    h.store.set_fail_writes(true);
    let result = h.manager.start(&failing.id).await;
    assert!(matches!(result, Err(ManagerError::Persist(_))));

    let timer = h.manager.timer(&failing.id).await.unwrap();
    assert_eq!(timer.status, TimerStatus::Running);
    assert!(h.manager.is_counting_down(&failing.id).await);

    // Ticks keep running in memory while saves fail
    advance(3).await;
    assert_eq!(h.manager.timer(&failing.id).await.unwrap().remaining_time, 27);
    assert_eq!(h.manager.timer(&other.id).await.unwrap().remaining_time, 27);

    h.store.set_fail_writes(false);
    sleep(Duration::from_secs(1)).await;
    let persisted = h.manager.storage().load_timers().await;
    assert!(persisted.iter().all(|t| t.remaining_time == 26));
}

#[tokio::test(start_paused = true)]
async fn timers_run_without_notification_permission() {
    let h = harness_with(Arc::new(MemoryStore::new()), false).await;
    assert!(!h.manager.notification_permission().await);

    let timer = h
        .manager
        .create_timer(&TimerDraft::new("Quiet", "4").halfway_alert(true))
        .await
        .unwrap();
    h.manager.start(&timer.id).await.unwrap();
    assert_eq!(h.notifier.pending_count(), 0);

    advance(4).await;
    assert!(h.manager.timers().await.is_empty());
    assert_eq!(h.manager.storage().load_history().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn invalid_draft_creates_nothing() {
    let h = harness().await;
    let result = h.manager.create_timer(&TimerDraft::new("", "30")).await;

    assert!(matches!(result, Err(ManagerError::Invalid(_))));
    assert!(h.manager.timers().await.is_empty());
    assert!(h.store.get("timers").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_all_countdowns() {
    let h = harness().await;
    let a = create(&h.manager, "A", 30, "A").await;
    let b = create(&h.manager, "B", 30, "B").await;
    h.manager.start(&a.id).await.unwrap();
    h.manager.start(&b.id).await.unwrap();

    h.manager.shutdown().await;
    assert_eq!(h.manager.active_countdowns().await, 0);

    advance(3).await;
    assert!(h
        .manager
        .timers()
        .await
        .iter()
        .all(|t| t.remaining_time == 30));
}
