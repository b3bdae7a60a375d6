//! Timer lifecycle: commands, countdown ticks and notification reconciliation

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::{
    sync::{broadcast, watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    categories::{filter_timers_by_category, group_timers_by_category, CategoryGroup},
    error::Result,
    notifications::NotificationGateway,
    state::{Timer, TimerDraft, TimerStatus},
    storage::StorageGateway,
    tasks::spawn_countdown,
};
use super::{BulkAction, Notice};

/// Default countdown period
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// What a countdown loop should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Finished,
}

/// Handle of a running countdown; `generation` identifies the run
#[derive(Debug)]
struct Countdown {
    generation: u64,
    task: JoinHandle<()>,
}

/// Everything mutated by commands and ticks, guarded by one lock
///
/// Each command or tick holds the lock for its whole read-modify-write,
/// including the save, so writes to storage are issued in mutation order.
#[derive(Debug, Default)]
struct ManagerState {
    timers: Vec<Timer>,
    halfway_fired: HashMap<String, bool>,
    countdowns: HashMap<String, Countdown>,
    next_generation: u64,
}

impl ManagerState {
    fn find_mut(&mut self, id: &str) -> Option<&mut Timer> {
        self.timers.iter_mut().find(|t| t.id == id)
    }

    fn abort_countdown(&mut self, id: &str) {
        if let Some(countdown) = self.countdowns.remove(id) {
            countdown.task.abort();
            debug!("Stopped countdown {} (run {})", id, countdown.generation);
        }
    }

    /// Abort the countdown for `id` and forget its halfway flag
    fn stop_countdown(&mut self, id: &str) {
        self.abort_countdown(id);
        self.halfway_fired.remove(id);
    }
}

struct Inner {
    storage: StorageGateway,
    notifications: Mutex<NotificationGateway>,
    state: Mutex<ManagerState>,
    tick_period: Duration,
    timers_tx: watch::Sender<Vec<Timer>>,
    notice_tx: broadcast::Sender<Notice>,
}

/// Owner of the active timer collection
///
/// Cheap to clone; all clones share the same collection.
#[derive(Clone)]
pub struct TimerManager {
    inner: Arc<Inner>,
}

/// Non-owning handle held by countdown tasks
#[derive(Clone)]
pub struct WeakTimerManager {
    inner: Weak<Inner>,
}

impl WeakTimerManager {
    pub fn upgrade(&self) -> Option<TimerManager> {
        self.inner.upgrade().map(|inner| TimerManager { inner })
    }
}

impl TimerManager {
    pub fn new(storage: StorageGateway, notifications: NotificationGateway) -> Self {
        Self::with_tick_period(storage, notifications, TICK_PERIOD)
    }

    pub fn with_tick_period(
        storage: StorageGateway,
        notifications: NotificationGateway,
        tick_period: Duration,
    ) -> Self {
        let (timers_tx, _) = watch::channel(Vec::new());
        let (notice_tx, _) = broadcast::channel(100);

        Self {
            inner: Arc::new(Inner {
                storage,
                notifications: Mutex::new(notifications),
                state: Mutex::new(ManagerState::default()),
                tick_period,
                timers_tx,
                notice_tx,
            }),
        }
    }

    pub fn downgrade(&self) -> WeakTimerManager {
        WeakTimerManager {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn storage(&self) -> &StorageGateway {
        &self.inner.storage
    }

    /// Receiver that always holds the latest published collection
    pub fn subscribe_timers(&self) -> watch::Receiver<Vec<Timer>> {
        self.inner.timers_tx.subscribe()
    }

    /// Halfway and completion notices
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notice_tx.subscribe()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn timers(&self) -> Vec<Timer> {
        self.inner.state.lock().await.timers.clone()
    }

    pub async fn timer(&self, id: &str) -> Option<Timer> {
        self.inner
            .state
            .lock()
            .await
            .timers
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub async fn filtered(&self, filter: &str) -> Vec<Timer> {
        filter_timers_by_category(&self.timers().await, filter)
    }

    pub async fn grouped(&self, filter: &str) -> Vec<CategoryGroup> {
        group_timers_by_category(&self.filtered(filter).await)
    }

    /// Whether a countdown loop is registered for `id`
    pub async fn is_counting_down(&self, id: &str) -> bool {
        self.inner.state.lock().await.countdowns.contains_key(id)
    }

    pub async fn active_countdowns(&self) -> usize {
        self.inner.state.lock().await.countdowns.len()
    }

    pub async fn notification_permission(&self) -> bool {
        self.inner.notifications.lock().await.permission_granted()
    }

    pub async fn request_notification_permission(&self) -> bool {
        self.inner.notifications.lock().await.request_permission().await
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Load the persisted collection and resume any running countdowns
    pub async fn load(&self) -> usize {
        let snapshot = self.inner.storage.load_timers().await;
        info!("Loaded {} persisted timers", snapshot.len());
        self.restart_running_timers(snapshot).await
    }

    /// Validate and add a new stopped timer
    pub async fn create_timer(&self, draft: &TimerDraft) -> Result<Timer> {
        let timer = draft.validate()?;

        let mut state = self.inner.state.lock().await;
        state.timers.push(timer.clone());
        info!("Created timer '{}' ({}s, {})", timer.name, timer.duration, timer.category);

        self.persist(&state).await?;
        Ok(timer)
    }

    /// `stopped | paused -> running`; returns whether anything changed
    pub async fn start(&self, id: &str) -> Result<bool> {
        let mut state = self.inner.state.lock().await;

        let Some(timer) = state.find_mut(id) else {
            debug!("Start ignored, unknown timer {}", id);
            return Ok(false);
        };
        if timer.status != TimerStatus::Stopped && timer.status != TimerStatus::Paused {
            debug!("Start ignored, timer {} is {}", id, timer.status);
            return Ok(false);
        }
        timer.status = TimerStatus::Running;
        let timer = timer.clone();

        let already_fired = state.halfway_fired.get(id).copied().unwrap_or(false);
        self.inner
            .notifications
            .lock()
            .await
            .schedule_timer_notifications(&timer, already_fired)
            .await;

        state.halfway_fired.insert(id.to_string(), false);
        self.spawn_countdown(&mut state, id);
        info!("Started '{}' with {}s remaining", timer.name, timer.remaining_time);

        self.persist(&state).await?;
        Ok(true)
    }

    /// `running -> paused`, keeping the remaining time
    pub async fn pause(&self, id: &str) -> Result<bool> {
        let mut state = self.inner.state.lock().await;

        match state.find_mut(id) {
            Some(timer) if timer.is_running() => timer.status = TimerStatus::Paused,
            Some(_) | None => {
                debug!("Pause ignored for timer {}", id);
                return Ok(false);
            }
        }

        state.stop_countdown(id);
        self.inner
            .notifications
            .lock()
            .await
            .cancel_timer_notifications(id)
            .await;
        info!("Paused timer {}", id);

        self.persist(&state).await?;
        Ok(true)
    }

    /// `any -> stopped` with the full duration restored
    pub async fn reset(&self, id: &str) -> Result<bool> {
        let mut state = self.inner.state.lock().await;

        match state.find_mut(id) {
            Some(timer) => timer.reset(),
            None => {
                debug!("Reset ignored, unknown timer {}", id);
                return Ok(false);
            }
        }

        state.stop_countdown(id);
        self.inner
            .notifications
            .lock()
            .await
            .cancel_timer_notifications(id)
            .await;
        info!("Reset timer {}", id);

        self.persist(&state).await?;
        Ok(true)
    }

    /// Remove a timer regardless of its status
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut state = self.inner.state.lock().await;

        let before = state.timers.len();
        state.timers.retain(|t| t.id != id);
        if state.timers.len() == before {
            debug!("Delete ignored, unknown timer {}", id);
            return Ok(false);
        }

        state.stop_countdown(id);
        self.inner
            .notifications
            .lock()
            .await
            .cancel_timer_notifications(id)
            .await;
        info!("Deleted timer {}", id);

        self.persist(&state).await?;
        Ok(true)
    }

    /// Apply `action` to every eligible timer in `category`
    ///
    /// Timers for which the action is a no-op are skipped. Every affected
    /// timer is persisted; the first persistence failure is returned after
    /// all timers have been processed.
    pub async fn bulk_action(&self, category: &str, action: BulkAction) -> Result<usize> {
        let candidates: Vec<(String, TimerStatus)> = self
            .inner
            .state
            .lock()
            .await
            .timers
            .iter()
            .filter(|t| t.category == category && t.status != TimerStatus::Completed)
            .map(|t| (t.id.clone(), t.status))
            .collect();

        let mut affected = 0;
        let mut first_error = None;

        for (id, status) in candidates {
            let outcome = match (action, status) {
                (BulkAction::Start, TimerStatus::Running) => continue,
                (BulkAction::Pause, s) if s != TimerStatus::Running => continue,
                (BulkAction::Start, _) => self.start(&id).await,
                (BulkAction::Pause, _) => self.pause(&id).await,
                (BulkAction::Reset, _) => self.reset(&id).await,
            };

            match outcome {
                Ok(true) => affected += 1,
                Ok(false) => {}
                Err(e) => {
                    affected += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        info!("Bulk {:?} on '{}' affected {} timers", action, category, affected);
        match first_error {
            Some(e) => Err(e),
            None => Ok(affected),
        }
    }

    /// Install `snapshot` as the collection and resume every running timer
    ///
    /// Countdowns resume from the persisted remaining time; time that passed
    /// while the process was down is not counted. Nothing is persisted.
    pub async fn restart_running_timers(&self, snapshot: Vec<Timer>) -> usize {
        let mut state = self.inner.state.lock().await;

        for (_, countdown) in state.countdowns.drain() {
            countdown.task.abort();
        }
        state.halfway_fired.clear();
        // Running timers are rescheduled below; everything else must not fire
        self.inner.notifications.lock().await.cancel_all().await;
        state.timers = snapshot
            .into_iter()
            .filter(|t| t.status != TimerStatus::Completed)
            .collect();

        let running: Vec<Timer> = state.timers.iter().filter(|t| t.is_running()).cloned().collect();
        for timer in &running {
            self.inner
                .notifications
                .lock()
                .await
                .schedule_timer_notifications(timer, false)
                .await;
            state.halfway_fired.insert(timer.id.clone(), false);
            self.spawn_countdown(&mut state, &timer.id);
            info!("Resumed '{}' with {}s remaining", timer.name, timer.remaining_time);
        }

        self.publish(&state);
        running.len()
    }

    /// Delete the completed-timer history
    ///
    /// Holds the state lock so a completing tick cannot write back a
    /// history list read before the clear.
    pub async fn clear_history(&self) -> Result<()> {
        let _state = self.inner.state.lock().await;
        self.inner.storage.clear_history().await?;
        Ok(())
    }

    /// Stop every countdown and drop all side tables
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.lock().await;
        let count = state.countdowns.len();
        for (_, countdown) in state.countdowns.drain() {
            countdown.task.abort();
        }
        state.halfway_fired.clear();
        self.inner.notifications.lock().await.forget_all();
        info!("Timer manager shut down ({} countdowns stopped)", count);
    }

    // ── Countdown ────────────────────────────────────────────────────

    fn spawn_countdown(&self, state: &mut ManagerState, id: &str) {
        state.abort_countdown(id);

        state.next_generation += 1;
        let generation = state.next_generation;
        let task = spawn_countdown(
            self.downgrade(),
            id.to_string(),
            generation,
            self.inner.tick_period,
        );
        state.countdowns.insert(id.to_string(), Countdown { generation, task });
    }

    /// One countdown step for `id`, run `generation`
    ///
    /// A tick from a run that is no longer registered, or for a timer that is
    /// gone or not running, changes nothing.
    pub async fn tick(&self, id: &str, generation: u64) -> TickOutcome {
        let mut state = self.inner.state.lock().await;

        if state.countdowns.get(id).map(|c| c.generation) != Some(generation) {
            debug!("Discarding stale tick for {} (run {})", id, generation);
            return TickOutcome::Finished;
        }

        let ManagerState {
            timers,
            halfway_fired,
            countdowns,
            ..
        } = &mut *state;

        let Some(index) = timers.iter().position(|t| t.id == id && t.is_running()) else {
            warn!("Countdown {} has no running timer, stopping it", id);
            countdowns.remove(id);
            halfway_fired.remove(id);
            return TickOutcome::Finished;
        };

        let timer = &mut timers[index];
        timer.remaining_time = timer.remaining_time.saturating_sub(1);
        debug!("Tick {}: {}s remaining", timer.name, timer.remaining_time);

        let fired = halfway_fired.entry(id.to_string()).or_insert(false);
        if timer.halfway_alert && !*fired && timer.remaining_time > 0 && timer.past_halfway() {
            *fired = true;
            self.notify(Notice::halfway(timer));
        }

        if timer.remaining_time > 0 {
            if let Err(e) = self.persist(&state).await {
                error!("Tick for {} not persisted: {}", id, e);
            }
            return TickOutcome::Continue;
        }

        let mut completed = timers.remove(index);
        completed.status = TimerStatus::Completed;
        countdowns.remove(id);
        halfway_fired.remove(id);
        self.inner.notifications.lock().await.forget_timer(id);
        info!("Timer '{}' completed", completed.name);

        if let Err(e) = self.inner.storage.save_to_history(&completed).await {
            error!("Failed to record '{}' in history: {}", completed.name, e);
        }
        self.notify(Notice::completed(&completed));

        if let Err(e) = self.persist(&state).await {
            error!("Completion of {} not persisted: {}", id, e);
        }
        TickOutcome::Finished
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn publish(&self, state: &ManagerState) {
        self.inner.timers_tx.send_replace(state.timers.clone());
    }

    fn notify(&self, notice: Notice) {
        debug!("Notice: {}", notice.message);
        // No listeners is fine
        let _ = self.inner.notice_tx.send(notice);
    }

    /// Publish then save the full collection
    async fn persist(&self, state: &ManagerState) -> Result<()> {
        self.publish(state);
        self.inner.storage.save_timers(&state.timers).await?;
        Ok(())
    }
}
