//! State management module
//!
//! Timer and history records plus the application state shared by handlers.

pub mod app_state;
pub mod history;
pub mod timer;

// Re-export main types
pub use app_state::AppState;
pub use history::HistoryItem;
pub use timer::{Timer, TimerDraft, TimerStatus, DEFAULT_CATEGORIES, DEFAULT_CATEGORY};
