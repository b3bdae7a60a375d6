//! Error types shared across the crate

use thiserror::Error;

/// Failures of the persistent key-value store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read/write store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode stored value: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Store rejected write for key '{0}'")]
    Rejected(String),
}

/// Creation-time input errors, reported to the user before any timer exists
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Timer name must not be empty")]
    EmptyName,

    #[error("Timer category must not be empty")]
    EmptyCategory,

    #[error("Please enter a valid duration in seconds (got '{0}')")]
    InvalidDuration(String),
}

/// Failures raised by the notification backend; never escape the gateway
#[derive(Error, Debug, Clone)]
pub enum NotificationError {
    #[error("Notification permission denied")]
    PermissionDenied,

    #[error("Notification backend failed: {0}")]
    Backend(String),
}

/// Errors returned by timer lifecycle commands
///
/// A persistence failure does not roll back the in-memory change; the
/// collection stays authoritative until the next successful save.
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Failed to persist timers: {0}")]
    Persist(#[from] StorageError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

pub type Result<T, E = ManagerError> = std::result::Result<T, E>;
