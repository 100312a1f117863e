//! Aggregated results of a batch run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::item::{BatchItem, ItemStatus};

/// Outcome of the refresh listing issued after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Nothing was submitted, so no refresh was needed.
    Skipped,
    Refreshed { entries: usize },
    Failed { reason: String },
}

/// Running tallies handed to a progress callback after each item.
#[derive(Debug, Clone, Serialize)]
pub struct BatchProgress {
    pub run_id: Uuid,
    /// 1-based position of `current`.
    pub position: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub current: BatchItem,
}

/// Every item of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub items: Vec<BatchItem>,
    pub refresh: RefreshOutcome,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    /// First `limit` outcomes plus totals.
    pub fn summary(&self, limit: usize) -> BatchSummary {
        BatchSummary {
            run_id: self.run_id,
            total: self.items.len(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            shown: self
                .items
                .iter()
                .take(limit)
                .map(|item| ItemOutcome {
                    input: item.raw_input.clone(),
                    status: item.status,
                    message: item.message.clone(),
                })
                .collect(),
            elided: self.items.len().saturating_sub(limit),
            refresh: self.refresh.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub input: String,
    pub status: ItemStatus,
    pub message: String,
}

/// Truncated view of a [`BatchReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub run_id: Uuid,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub shown: Vec<ItemOutcome>,
    /// Outcomes left out of `shown`.
    pub elided: usize,
    pub refresh: RefreshOutcome,
}
