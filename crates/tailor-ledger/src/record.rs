//! Usage records and operation tags
//!
//! This module contains the immutable per-call entry stored in the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Why an agent call was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Job-description / résumé analysis pass
    Analysis,
    /// Full customization run
    Customization,
    /// Follow-up optimization pass
    Optimization,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Analysis => write!(f, "analysis"),
            Self::Customization => write!(f, "customization"),
            Self::Optimization => write!(f, "optimization"),
        }
    }
}

impl FromStr for OperationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "analysis" => Ok(Self::Analysis),
            "customization" => Ok(Self::Customization),
            "optimization" => Ok(Self::Optimization),
            other => Err(Error::InvalidUsage(format!(
                "unknown operation kind: {other} (expected analysis, customization, or optimization)"
            ))),
        }
    }
}

/// A single recorded agent invocation.
///
/// Created once per completed call, never mutated afterwards; token counts
/// are unsigned so negative usage is unrepresentable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// When the call completed
    pub timestamp: DateTime<Utc>,
    /// Model identifier reported by the agent
    pub model: String,
    /// Input tokens consumed
    pub input_tokens: u64,
    /// Output tokens produced
    pub output_tokens: u64,
    /// Cost in USD, rounded to four decimal places
    pub cost: f64,
    /// Why the call was made
    pub operation: OperationKind,
}

impl UsageRecord {
    /// Total tokens for this record
    #[must_use]
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}
