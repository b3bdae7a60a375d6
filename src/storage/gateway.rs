//! Typed access to timers, history and the category filter

use std::sync::Arc;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::{
    categories::ALL_CATEGORIES,
    error::StorageError,
    state::{HistoryItem, Timer},
};
use super::KeyValueStore;

pub const TIMERS_KEY: &str = "timers";
pub const HISTORY_KEY: &str = "timerHistory";
pub const CATEGORY_FILTER_KEY: &str = "categoryFilter";

/// Durable mirror of the timer collection, history and filter preference
///
/// Reads never fail: a missing or unreadable value is logged and treated as
/// "no data". Writes report failures so callers can surface them.
#[derive(Clone)]
pub struct StorageGateway {
    store: Arc<dyn KeyValueStore>,
}

impl StorageGateway {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn load_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!("Failed to load '{}': {}", key, e);
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            error!("Failed to parse '{}': {}", key, e);
            Vec::new()
        })
    }

    async fn save_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(items)?;
        self.store.set(key, &raw).await.map_err(|e| {
            error!("Failed to save '{}': {}", key, e);
            e
        })
    }

    pub async fn load_timers(&self) -> Vec<Timer> {
        self.load_list(TIMERS_KEY).await
    }

    pub async fn save_timers(&self, timers: &[Timer]) -> Result<(), StorageError> {
        self.save_list(TIMERS_KEY, timers).await
    }

    /// History, newest completion first
    pub async fn load_history(&self) -> Vec<HistoryItem> {
        let mut history: Vec<HistoryItem> = self.load_list(HISTORY_KEY).await;
        history.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        history
    }

    /// Append a record of `timer` completing now
    pub async fn save_to_history(&self, timer: &Timer) -> Result<HistoryItem, StorageError> {
        let item = HistoryItem::from_timer(timer, Utc::now());

        let mut history: Vec<HistoryItem> = self.load_list(HISTORY_KEY).await;
        history.push(item.clone());
        self.save_list(HISTORY_KEY, &history).await?;

        info!("Recorded '{}' in history ({} items)", item.name, history.len());
        Ok(item)
    }

    pub async fn clear_history(&self) -> Result<(), StorageError> {
        self.store.remove(HISTORY_KEY).await.map_err(|e| {
            error!("Failed to clear history: {}", e);
            e
        })
    }

    pub async fn load_category_filter(&self) -> String {
        match self.store.get(CATEGORY_FILTER_KEY).await {
            Ok(Some(filter)) if !filter.is_empty() => filter,
            Ok(_) => ALL_CATEGORIES.to_string(),
            Err(e) => {
                error!("Failed to load category filter: {}", e);
                ALL_CATEGORIES.to_string()
            }
        }
    }

    pub async fn save_category_filter(&self, filter: &str) -> Result<(), StorageError> {
        self.store.set(CATEGORY_FILTER_KEY, filter).await.map_err(|e| {
            error!("Failed to save filter: {}", e);
            e
        })
    }

    pub async fn clear_category_filter(&self) -> Result<(), StorageError> {
        self.store.remove(CATEGORY_FILTER_KEY).await.map_err(|e| {
            error!("Failed to clear filter: {}", e);
            e
        })
    }
}
