//! Ledger export
//!
//! Serializes call history to CSV rows or to a structured JSON document with
//! an embedded summary. Both renderings are pure reads.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::ledger::UsageLedger;
use crate::record::UsageRecord;
use crate::summary::{summarize, UsageSummary};

/// Header row of the CSV rendering
pub const CSV_HEADER: &str = "timestamp,model,input_tokens,output_tokens,cost,operation";

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// One row per record
    Csv,
    /// Records plus the embedded summary
    Json,
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(Error::ExportFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// The structured export document (`json` format)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    /// When the export was produced
    pub export_date: DateTime<Utc>,
    /// Lookback window in whole days
    pub period_days: i64,
    /// Aggregated view over the window
    pub summary: UsageSummary,
    /// The exported records
    pub calls: Vec<UsageRecord>,
    /// Budget settings at export time
    pub budgets: ExportBudgets,
}

/// Budget fields embedded in an export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportBudgets {
    /// Daily limit (USD), if set
    pub daily_budget: Option<f64>,
    /// Monthly limit (USD), if set
    pub monthly_budget: Option<f64>,
}

/// Render records with `timestamp >= since` in the requested format.
pub fn render(
    ledger: &UsageLedger,
    format: ExportFormat,
    since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Vec<u8>> {
    let records: Vec<&UsageRecord> = ledger
        .calls
        .iter()
        .filter(|c| c.timestamp >= since)
        .collect();

    match format {
        ExportFormat::Csv => Ok(to_csv(&records).into_bytes()),
        ExportFormat::Json => {
            let summary = summarize(ledger, since, now);
            let document = ExportDocument {
                export_date: now,
                period_days: summary.period_days,
                summary,
                calls: records.into_iter().cloned().collect(),
                budgets: ExportBudgets {
                    daily_budget: ledger.daily_budget,
                    monthly_budget: ledger.monthly_budget,
                },
            };

            serde_json::to_vec_pretty(&document)
                .map_err(|e| Error::Storage(format!("failed to serialize export: {}", e)))
        }
    }
}

fn to_csv(records: &[&UsageRecord]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for record in records {
        // The model identifier is the only free-form column.
        out.push_str(&format!(
            "{},{},{},{},{:.4},{}\n",
            record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            csv_field(&record.model),
            record.input_tokens,
            record.output_tokens,
            record.cost,
            record.operation,
        ));
    }

    out
}

/// Quote a field when it would otherwise break the row (RFC 4180 style).
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
