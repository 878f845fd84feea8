//! Aggregated usage views

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ledger::UsageLedger;
use crate::record::OperationKind;

/// Per-model aggregate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelStats {
    /// Call count
    pub calls: u64,
    /// Total input tokens
    pub input_tokens: u64,
    /// Total output tokens
    pub output_tokens: u64,
    /// Total cost (USD)
    pub cost: f64,
}

/// Per-operation aggregate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationStats {
    /// Call count
    pub calls: u64,
    /// Total cost (USD)
    pub cost: f64,
}

/// Aggregated usage over a lookback window
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Number of records in the window
    pub total_calls: u64,
    /// Total cost (USD)
    pub total_cost: f64,
    /// Total input tokens
    pub total_input_tokens: u64,
    /// Total output tokens
    pub total_output_tokens: u64,
    /// Aggregates keyed by model identifier
    pub by_model: HashMap<String, ModelStats>,
    /// Aggregates keyed by operation kind
    pub by_operation: HashMap<OperationKind, OperationStats>,
    /// Window length in whole days (at least 1)
    pub period_days: i64,
    /// `total_cost / period_days`
    pub daily_average_cost: f64,
}

/// Aggregate records with `timestamp >= since`.
///
/// An empty window yields all-zero aggregates and empty maps, not an error.
#[must_use]
pub fn summarize(ledger: &UsageLedger, since: DateTime<Utc>, now: DateTime<Utc>) -> UsageSummary {
    let mut summary = UsageSummary::default();

    for record in ledger.calls.iter().filter(|c| c.timestamp >= since) {
        summary.total_calls += 1;
        summary.total_cost += record.cost;
        summary.total_input_tokens += record.input_tokens;
        summary.total_output_tokens += record.output_tokens;

        let model = summary.by_model.entry(record.model.clone()).or_default();
        model.calls += 1;
        model.input_tokens += record.input_tokens;
        model.output_tokens += record.output_tokens;
        model.cost += record.cost;

        let operation = summary.by_operation.entry(record.operation).or_default();
        operation.calls += 1;
        operation.cost += record.cost;
    }

    summary.period_days = (now - since).num_days().max(1);
    summary.daily_average_cost = summary.total_cost / summary.period_days as f64;
    summary
}
