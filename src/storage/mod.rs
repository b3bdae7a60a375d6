//! Persistence module
//!
//! An opaque async key-value store and the typed gateway the timer manager
//! persists through.

pub mod gateway;
pub mod store;

pub use gateway::StorageGateway;
pub use store::{FileStore, KeyValueStore, MemoryStore};
