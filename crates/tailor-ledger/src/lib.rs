//! Tailor Ledger - usage accounting and budget enforcement
//!
//! This crate is the cost core of the tailor CLI:
//! - Pricing: strict model → USD-per-1M-token lookup (unknown models are an
//!   error, never a silent zero)
//! - Recorder: converts token usage into persisted [`UsageRecord`]s
//! - Budget guard: allow/warn/block decisions against daily and monthly
//!   limits
//! - Summary/Export: aggregated views and CSV/JSON serialization
//!
//! The ledger lives in a single JSON document under the user's home
//! directory, loaded once per process and rewritten atomically after every
//! mutation. It is designed for one in-process writer at a time; concurrent
//! processes sharing one ledger file are not coordinated.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod budget;
pub mod error;
pub mod export;
pub mod ledger;
pub mod pricing;
pub mod record;
pub mod store;
pub mod summary;
pub mod tracker;

pub use budget::{BudgetDecision, WARN_THRESHOLD};
pub use error::{Error, Result};
pub use export::{ExportBudgets, ExportDocument, ExportFormat, CSV_HEADER};
pub use ledger::{UsageLedger, MAX_LEDGER_RECORDS};
pub use pricing::{default_pricing, round_currency, ModelPricing, PricingTable};
pub use record::{OperationKind, UsageRecord};
pub use store::{LedgerStore, LEDGER_PATH_ENV};
pub use summary::{ModelStats, OperationStats, UsageSummary};
pub use tracker::CostTracker;
