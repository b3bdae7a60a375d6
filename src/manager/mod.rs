//! Timer lifecycle manager
//!
//! Owns the active timer collection, drives one countdown task per running
//! timer and keeps scheduled notifications in step with timer state.

pub mod events;
pub mod lifecycle;

pub use events::{BulkAction, Notice, NoticeKind};
pub use lifecycle::{TickOutcome, TimerManager, WeakTimerManager, TICK_PERIOD};
