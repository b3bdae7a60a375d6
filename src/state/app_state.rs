//! Main application state shared by the HTTP handlers

use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{manager::TimerManager, storage::StorageGateway};

/// Application state: the timer manager plus server metadata
pub struct AppState {
    pub manager: TimerManager,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last command tracking
    pub last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    pub fn new(manager: TimerManager, port: u16, host: String) -> Self {
        Self {
            manager,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        }
    }

    pub fn storage(&self) -> &StorageGateway {
        self.manager.storage()
    }

    /// Remember the most recent command for the status endpoint
    pub async fn record_action(&self, action: impl Into<String>) {
        *self.last_action.lock().await = Some((action.into(), Utc::now()));
    }

    pub async fn last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().await.clone() {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
