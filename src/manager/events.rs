//! Commands and in-app notices exchanged with the timer manager

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{format::format_time, state::Timer};

/// Action applied to every eligible timer of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Start,
    Pause,
    Reset,
}

impl FromStr for BulkAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "pause" => Ok(Self::Pause),
            "reset" => Ok(Self::Reset),
            other => Err(format!("Unknown bulk action: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Halfway,
    Completed,
}

/// Transient in-app message raised by the countdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub kind: NoticeKind,
    pub timer_id: String,
    pub message: String,
}

impl Notice {
    pub fn halfway(timer: &Timer) -> Self {
        Self {
            kind: NoticeKind::Halfway,
            timer_id: timer.id.clone(),
            message: format!(
                "🔔 {} is halfway done! {} remaining",
                timer.name,
                format_time(timer.remaining_time)
            ),
        }
    }

    pub fn completed(timer: &Timer) -> Self {
        Self {
            kind: NoticeKind::Completed,
            timer_id: timer.id.clone(),
            message: format!("🎉 {} completed!", timer.name),
        }
    }
}
