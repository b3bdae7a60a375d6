//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    categories::CategoryGroup,
    format::{format_time, progress_fraction},
    state::{Timer, TimerDraft},
};

/// Timer as shown to clients, with display helpers precomputed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    #[serde(flatten)]
    pub timer: Timer,
    pub formatted_remaining: String,
    pub progress: f64,
}

impl From<Timer> for TimerView {
    fn from(timer: Timer) -> Self {
        Self {
            formatted_remaining: format_time(timer.remaining_time),
            progress: progress_fraction(&timer),
            timer,
        }
    }
}

pub fn views(timers: Vec<Timer>) -> Vec<TimerView> {
    timers.into_iter().map(TimerView::from).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub category: String,
    pub timers: Vec<TimerView>,
}

impl From<CategoryGroup> for GroupView {
    fn from(group: CategoryGroup) -> Self {
        Self {
            category: group.category,
            timers: views(group.timers),
        }
    }
}

/// Response for GET /timers
#[derive(Debug, Clone, Serialize)]
pub struct TimersResponse {
    pub filter: String,
    pub timers: Vec<TimerView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<GroupView>>,
}

/// Response for every state-changing command
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub status: String,
    pub message: String,
    pub applied: bool,
    pub timestamp: DateTime<Utc>,
    pub timers: Vec<TimerView>,
}

impl CommandResponse {
    pub fn new(status: &str, message: String, applied: bool, timers: Vec<Timer>) -> Self {
        Self {
            status: status.to_string(),
            message,
            applied,
            timestamp: Utc::now(),
            timers: views(timers),
        }
    }

    pub fn applied(message: String, timers: Vec<Timer>) -> Self {
        Self::new("applied", message, true, timers)
    }

    pub fn ignored(message: String, timers: Vec<Timer>) -> Self {
        Self::new("ignored", message, false, timers)
    }

    /// State changed in memory but could not be saved
    pub fn unsaved(message: String, timers: Vec<Timer>) -> Self {
        Self::new("error", message, true, timers)
    }
}

/// Plain error body
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

/// Duration as typed by the user: a number or free text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationInput {
    Seconds(i64),
    Text(String),
}

/// Body of POST /timers
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimerRequest {
    pub name: String,
    pub duration: DurationInput,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub halfway_alert: bool,
}

impl From<CreateTimerRequest> for TimerDraft {
    fn from(request: CreateTimerRequest) -> Self {
        let duration = match request.duration {
            DurationInput::Seconds(seconds) => seconds.to_string(),
            DurationInput::Text(text) => text,
        };
        TimerDraft {
            name: request.name,
            duration,
            category: request.category,
            halfway_alert: request.halfway_alert,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimersQuery {
    pub category: Option<String>,
    #[serde(default)]
    pub grouped: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterBody {
    pub filter: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoriesResponse {
    /// Categories used by at least one active timer
    pub categories: Vec<String>,
    /// Presets offered when creating a timer
    pub presets: Vec<String>,
}

/// Status response with timer and notification information
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub timers: usize,
    pub running: usize,
    pub notifications_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
