//! Per-timer notification bookkeeping on top of a backend

use std::{collections::HashMap, sync::Arc, time::Duration};

use tracing::{debug, error, info, warn};

use crate::state::Timer;
use super::NotificationBackend;

/// Ids of the notifications currently scheduled for one timer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingNotifications {
    pub completion: Option<String>,
    pub halfway: Option<String>,
}

impl PendingNotifications {
    fn is_empty(&self) -> bool {
        self.completion.is_none() && self.halfway.is_none()
    }
}

/// Best-effort notification scheduling; failures are logged and swallowed
pub struct NotificationGateway {
    backend: Arc<dyn NotificationBackend>,
    pending: HashMap<String, PendingNotifications>,
    permission_granted: bool,
}

impl NotificationGateway {
    pub fn new(backend: Arc<dyn NotificationBackend>) -> Self {
        Self {
            backend,
            pending: HashMap::new(),
            permission_granted: false,
        }
    }

    pub async fn request_permission(&mut self) -> bool {
        self.permission_granted = self.backend.request_permission().await;
        if self.permission_granted {
            info!("Notification permission granted");
        } else {
            warn!("Notification permission denied; timers will run without notifications");
        }
        self.permission_granted
    }

    /// Whether the last permission request was granted
    pub fn permission_granted(&self) -> bool {
        self.permission_granted
    }

    /// Schedule a one-shot notification, `None` on failure or denied permission
    pub async fn schedule_one_shot(&self, title: &str, body: &str, delay: Duration) -> Option<String> {
        match self.backend.schedule(title, body, delay).await {
            Ok(id) => {
                debug!("Scheduled notification: {} in {:?} with ID: {}", title, delay, id);
                Some(id)
            }
            Err(e) => {
                error!("Failed to schedule notification: {}", e);
                None
            }
        }
    }

    pub async fn cancel(&self, id: &str) {
        if let Err(e) = self.backend.cancel(id).await {
            error!("Failed to cancel notification {}: {}", id, e);
        }
    }

    /// Replace whatever is scheduled for `timer` with notifications for its current run
    pub async fn schedule_timer_notifications(&mut self, timer: &Timer, halfway_already_fired: bool) {
        self.cancel_timer_notifications(&timer.id).await;

        let mut scheduled = PendingNotifications::default();

        if timer.remaining_time > 0 {
            scheduled.completion = self
                .schedule_one_shot(
                    "Timer Completed!",
                    &format!("{} has finished!", timer.name),
                    Duration::from_secs(timer.remaining_time),
                )
                .await;
        }

        if timer.halfway_alert && !halfway_already_fired {
            let time_to_halfway =
                timer.remaining_time as f64 - timer.original_duration as f64 / 2.0;
            if time_to_halfway > 0.0 {
                scheduled.halfway = self
                    .schedule_one_shot(
                        "Halfway Alert!",
                        &format!("{} is halfway done!", timer.name),
                        Duration::from_secs_f64(time_to_halfway),
                    )
                    .await;
            }
        }

        if !scheduled.is_empty() {
            self.pending.insert(timer.id.clone(), scheduled);
        }
    }

    /// Cancel and forget the notifications held for `timer_id`
    pub async fn cancel_timer_notifications(&mut self, timer_id: &str) {
        let Some(pending) = self.pending.remove(timer_id) else {
            return;
        };
        for id in [pending.completion, pending.halfway].into_iter().flatten() {
            self.cancel(&id).await;
        }
    }

    pub async fn cancel_all(&mut self) {
        if let Err(e) = self.backend.cancel_all().await {
            error!("Failed to cancel notifications: {}", e);
        }
        self.pending.clear();
    }

    /// Drop bookkeeping for `timer_id` without cancelling (its notification already fired)
    pub fn forget_timer(&mut self, timer_id: &str) {
        self.pending.remove(timer_id);
    }

    pub fn forget_all(&mut self) {
        self.pending.clear();
    }

    pub fn pending_for(&self, timer_id: &str) -> Option<&PendingNotifications> {
        self.pending.get(timer_id)
    }
}
