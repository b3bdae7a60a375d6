//! Countdown Keeper - A state-managed HTTP server for countdown timers
//!
//! Users create named, categorized countdowns, run several at once, get
//! local notifications at completion and halfway points, and review a
//! history of completed timers.

pub mod api;
pub mod categories;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod manager;
pub mod notifications;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use manager::{BulkAction, Notice, TimerManager};
pub use state::{AppState, HistoryItem, Timer, TimerDraft, TimerStatus};
pub use utils::signals::shutdown_signal;
