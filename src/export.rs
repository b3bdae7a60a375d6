//! Export document built from timer history

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{format::format_duration, state::HistoryItem};

/// Totals for one category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub count: usize,
    pub total_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportItem {
    pub name: String,
    pub category: String,
    pub duration: u64,
    pub formatted_duration: String,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub total_timers: usize,
    pub total_time_spent: u64,
    pub total_time_spent_formatted: String,
    pub items: Vec<ExportItem>,
    pub categories_summary: BTreeMap<String, CategorySummary>,
}

impl ExportDocument {
    pub fn build(history: &[HistoryItem], exported_at: DateTime<Utc>) -> Self {
        let mut categories_summary: BTreeMap<String, CategorySummary> = BTreeMap::new();
        let mut total_time_spent = 0;

        let items = history
            .iter()
            .map(|item| {
                total_time_spent += item.original_duration;
                let summary = categories_summary.entry(item.category.clone()).or_default();
                summary.count += 1;
                summary.total_time += item.original_duration;

                ExportItem {
                    name: item.name.clone(),
                    category: item.category.clone(),
                    duration: item.original_duration,
                    formatted_duration: format_duration(item.original_duration),
                    completed_at: item.completed_at,
                }
            })
            .collect();

        Self {
            exported_at,
            total_timers: history.len(),
            total_time_spent,
            total_time_spent_formatted: format_duration(total_time_spent),
            items,
            categories_summary,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
