//! Timer structure and creation-time validation

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Category assigned when a draft does not name one
pub const DEFAULT_CATEGORY: &str = "Other";

/// Preset categories offered to clients when creating a timer
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Workout", "Study", "Break", "Other"];

/// Lifecycle status of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Stopped,
    Running,
    Paused,
    /// Transient: a completed timer is moved to history and never stored as active.
    Completed,
}

impl TimerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-defined countdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: String,
    pub name: String,
    /// Configured duration in seconds, mirrored by `original_duration`
    pub duration: u64,
    pub category: String,
    pub status: TimerStatus,
    pub remaining_time: u64,
    pub original_duration: u64,
    pub halfway_alert: bool,
}

impl Timer {
    /// Create a stopped timer with a fresh id and a full countdown
    pub fn new(name: String, category: String, duration: u64, halfway_alert: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            duration,
            category,
            status: TimerStatus::Stopped,
            remaining_time: duration,
            original_duration: duration,
            halfway_alert,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// True once remaining time has dropped to half the original duration or below
    pub fn past_halfway(&self) -> bool {
        self.remaining_time * 2 <= self.original_duration
    }

    /// Restore the full duration and stop
    pub fn reset(&mut self) {
        self.status = TimerStatus::Stopped;
        self.remaining_time = self.original_duration;
    }
}

/// Raw creation input, validated into a [`Timer`]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerDraft {
    pub name: String,
    /// Duration in seconds as entered by the user
    pub duration: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub halfway_alert: bool,
}

impl TimerDraft {
    pub fn new(name: impl Into<String>, duration: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duration: duration.into(),
            ..Self::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn halfway_alert(mut self, enabled: bool) -> Self {
        self.halfway_alert = enabled;
        self
    }

    /// Validate the draft; nothing is constructed unless every field is acceptable
    pub fn validate(&self) -> Result<Timer, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let category = match self.category.as_deref().map(str::trim) {
            Some("") => return Err(ValidationError::EmptyCategory),
            Some(category) => category,
            None => DEFAULT_CATEGORY,
        };

        let raw = self.duration.trim();
        let seconds: i64 = raw
            .parse()
            .map_err(|_| ValidationError::InvalidDuration(raw.to_string()))?;
        if seconds <= 0 {
            return Err(ValidationError::InvalidDuration(raw.to_string()));
        }

        Ok(Timer::new(
            name.to_string(),
            category.to_string(),
            seconds as u64,
            self.halfway_alert,
        ))
    }
}
