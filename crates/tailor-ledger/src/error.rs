//! Error types for tailor-ledger

use thiserror::Error;

/// Ledger error type
#[derive(Debug, Error)]
pub enum Error {
    /// Model identifier missing from the pricing table
    #[error("unknown model: {model} (no pricing entry, cost would go unaccounted)")]
    UnknownModel {
        /// The identifier that failed lookup
        model: String,
    },

    /// Malformed numeric input (negative or non-finite amount)
    #[error("invalid usage input: {0}")]
    InvalidUsage(String),

    /// Unrecognized export format identifier
    #[error("unsupported export format: {0} (expected csv or json)")]
    ExportFormat(String),

    /// Ledger file could not be loaded or persisted
    #[error("ledger storage error: {0}")]
    Storage(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
