//! Local notification backends

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{sync::broadcast, task::JoinHandle, time::sleep};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::NotificationError;

/// Shortest delay a one-shot notification may be scheduled with
pub const MIN_DELAY: Duration = Duration::from_secs(1);

/// Platform primitive: schedule or cancel one-shot notifications by id
#[async_trait]
pub trait NotificationBackend: Send + Sync + 'static {
    /// Ask for permission to post notifications; returns whether it is granted
    async fn request_permission(&self) -> bool;

    /// Schedule a notification `delay` from now and return its id
    async fn schedule(
        &self,
        title: &str,
        body: &str,
        delay: Duration,
    ) -> Result<String, NotificationError>;

    async fn cancel(&self, id: &str) -> Result<(), NotificationError>;

    async fn cancel_all(&self) -> Result<(), NotificationError>;
}

/// A notification that reached its trigger time
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredNotification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub delivered_at: DateTime<Utc>,
}

type PendingTasks = Arc<Mutex<HashMap<String, JoinHandle<()>>>>;

/// In-process backend: each notification is a sleeping task that logs and
/// broadcasts itself when due
#[derive(Debug)]
pub struct LocalNotifier {
    allowed: bool,
    granted: AtomicBool,
    pending: PendingTasks,
    delivered_tx: broadcast::Sender<DeliveredNotification>,
}

impl LocalNotifier {
    /// `allowed = false` simulates a user who declines the permission prompt
    pub fn new(allowed: bool) -> Self {
        let (delivered_tx, _) = broadcast::channel(100);
        Self {
            allowed,
            granted: AtomicBool::new(false),
            pending: Arc::new(Mutex::new(HashMap::new())),
            delivered_tx,
        }
    }

    /// Subscribe to delivered notifications
    pub fn subscribe(&self) -> broadcast::Receiver<DeliveredNotification> {
        self.delivered_tx.subscribe()
    }

    /// Number of notifications still waiting to fire
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl Drop for LocalNotifier {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.drain().for_each(|(_, task)| task.abort());
        }
    }
}

#[async_trait]
impl NotificationBackend for LocalNotifier {
    async fn request_permission(&self) -> bool {
        self.granted.store(self.allowed, Ordering::SeqCst);
        debug!("Notification permission requested, granted={}", self.allowed);
        self.allowed
    }

    async fn schedule(
        &self,
        title: &str,
        body: &str,
        delay: Duration,
    ) -> Result<String, NotificationError> {
        if !self.granted.load(Ordering::SeqCst) {
            return Err(NotificationError::PermissionDenied);
        }

        let id = Uuid::new_v4().to_string();
        let delay = delay.max(MIN_DELAY);
        let (title_owned, body_owned) = (title.to_string(), body.to_string());
        let tx = self.delivered_tx.clone();
        let task_id = id.clone();
        let task_pending = Arc::clone(&self.pending);

        // Hold the lock across spawn+insert so a finished task never races
        // its own registration
        let mut tasks = self
            .pending
            .lock()
            .map_err(|e| NotificationError::Backend(format!("Failed to lock pending: {}", e)))?;
        let task = tokio::spawn(async move {
            sleep(delay).await;
            if let Ok(mut tasks) = task_pending.lock() {
                tasks.remove(&task_id);
            }
            let notification = DeliveredNotification {
                id: task_id,
                title: title_owned,
                body: body_owned,
                delivered_at: Utc::now(),
            };
            info!("🔔 {}: {}", notification.title, notification.body);
            // No subscribers is fine
            let _ = tx.send(notification);
        });
        tasks.insert(id.clone(), task);
        drop(tasks);

        debug!("Scheduled notification '{}' in {:?} with ID: {}", title, delay, id);
        Ok(id)
    }

    async fn cancel(&self, id: &str) -> Result<(), NotificationError> {
        let task = self
            .pending
            .lock()
            .map_err(|e| NotificationError::Backend(format!("Failed to lock pending: {}", e)))?
            .remove(id);
        if let Some(task) = task {
            task.abort();
            debug!("Cancelled notification: {}", id);
        }
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), NotificationError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|e| NotificationError::Backend(format!("Failed to lock pending: {}", e)))?;
        let count = pending.len();
        pending.drain().for_each(|(_, task)| task.abort());
        debug!("Cancelled {} pending notifications", count);
        Ok(())
    }
}
