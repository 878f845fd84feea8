//! The persisted usage ledger document
//!
//! Holds the chronological call history plus the two optional budget
//! settings. Totals are always derived from the records themselves; there is
//! no separate counter that could drift out of sync.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::record::UsageRecord;

/// Maximum records retained before the oldest are pruned
pub const MAX_LEDGER_RECORDS: usize = 1000;

/// The ledger document as written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLedger {
    /// Chronological call history (append-only)
    pub calls: Vec<UsageRecord>,
    /// Optional daily spend limit (USD, ≥ 0 when set)
    pub daily_budget: Option<f64>,
    /// Optional monthly spend limit (USD, ≥ 0 when set)
    pub monthly_budget: Option<f64>,
    /// Timestamp of the last mutation
    pub last_updated: DateTime<Utc>,
}

impl Default for UsageLedger {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            daily_budget: None,
            monthly_budget: None,
            last_updated: Utc::now(),
        }
    }
}

impl UsageLedger {
    /// Sum of all recorded costs
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.calls.iter().map(|c| c.cost).sum()
    }

    /// Sum of all recorded input tokens
    #[must_use]
    pub fn total_input_tokens(&self) -> u64 {
        self.calls.iter().map(|c| c.input_tokens).sum()
    }

    /// Sum of all recorded output tokens
    #[must_use]
    pub fn total_output_tokens(&self) -> u64 {
        self.calls.iter().map(|c| c.output_tokens).sum()
    }

    /// Cost accumulated during the UTC calendar day containing `now`
    #[must_use]
    pub fn spent_today(&self, now: DateTime<Utc>) -> f64 {
        let today = now.date_naive();
        self.calls
            .iter()
            .filter(|c| c.timestamp.date_naive() == today)
            .map(|c| c.cost)
            .sum()
    }

    /// Cost accumulated during the UTC calendar month containing `now`
    #[must_use]
    pub fn spent_this_month(&self, now: DateTime<Utc>) -> f64 {
        self.calls
            .iter()
            .filter(|c| c.timestamp.year() == now.year() && c.timestamp.month() == now.month())
            .map(|c| c.cost)
            .sum()
    }

    /// Append a record, pruning the oldest entries first so the length never
    /// exceeds `max_records`. The incoming record itself is never pruned, so
    /// a cap of zero still retains the newest entry.
    pub fn append(&mut self, record: UsageRecord, max_records: usize) {
        if self.calls.len() >= max_records {
            // Leave room for the incoming record.
            let keep = max_records.saturating_sub(1);
            self.calls.drain(0..self.calls.len() - keep);
        }
        self.calls.push(record);
        self.last_updated = Utc::now();
    }
}
