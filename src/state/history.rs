//! Completed timer records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Timer;

/// Immutable record of a timer that ran to completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub completed_at: DateTime<Utc>,
    pub original_duration: u64,
}

impl HistoryItem {
    /// Record a completion of `timer` at `completed_at` under a new id
    pub fn from_timer(timer: &Timer, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: timer.name.clone(),
            category: timer.category.clone(),
            completed_at,
            original_duration: timer.original_duration,
        }
    }
}
