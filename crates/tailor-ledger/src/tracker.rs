//! Cost tracker - the process-wide ledger handle
//!
//! Owns the pricing table, the in-memory ledger, and its store. Constructed
//! once at startup and passed explicitly to every caller that records or
//! inspects spend; there is no hidden global instance.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::budget::{self, BudgetDecision};
use crate::error::{Error, Result};
use crate::export::{self, ExportFormat};
use crate::ledger::{UsageLedger, MAX_LEDGER_RECORDS};
use crate::pricing::PricingTable;
use crate::record::{OperationKind, UsageRecord};
use crate::store::LedgerStore;
use crate::summary::{summarize, UsageSummary};

/// Cost tracker backed by a persisted ledger
#[derive(Debug)]
pub struct CostTracker {
    pricing: PricingTable,
    ledger: UsageLedger,
    store: LedgerStore,
    max_records: usize,
}

impl CostTracker {
    /// Open the ledger behind `store`, starting empty when no file exists
    pub fn open(store: LedgerStore) -> Result<Self> {
        let ledger = store.load()?;
        debug!(path = ?store.path(), calls = ledger.calls.len(), "Ledger opened");

        Ok(Self {
            pricing: PricingTable::default(),
            ledger,
            store,
            max_records: MAX_LEDGER_RECORDS,
        })
    }

    /// Replace the pricing table
    #[must_use]
    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    /// Cap the retained record count (minimum 1)
    #[must_use]
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = max.max(1);
        self
    }

    /// Read access to the ledger
    #[must_use]
    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    /// The pricing table in use
    #[must_use]
    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Location of the persisted ledger
    #[must_use]
    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Estimate the cost of a call without recording it
    pub fn estimate_cost(&self, model: &str, input_tokens: u64, output_tokens: u64) -> Result<f64> {
        self.pricing.estimate(model, input_tokens, output_tokens)
    }

    /// Record a completed agent call.
    ///
    /// Computes the cost from the pricing table, appends the record (pruning
    /// the oldest entries beyond the retention cap first), and persists the
    /// ledger before returning. On any failure both the in-memory ledger and
    /// the file are left exactly as they were.
    pub fn record(
        &mut self,
        model: &str,
        input_tokens: u64,
        output_tokens: u64,
        operation: OperationKind,
    ) -> Result<UsageRecord> {
        let cost = self.pricing.estimate(model, input_tokens, output_tokens)?;

        let record = UsageRecord {
            timestamp: Utc::now(),
            model: model.to_string(),
            input_tokens,
            output_tokens,
            cost,
            operation,
        };

        // Stage the mutation; the live ledger is only replaced once the
        // updated document is durably on disk.
        let mut next = self.ledger.clone();
        next.append(record.clone(), self.max_records);
        self.store.save(&next)?;
        self.ledger = next;

        info!(model, input_tokens, output_tokens, cost, operation = %operation, "Usage recorded");
        Ok(record)
    }

    /// Pre-flight budget check for a pending spend. Pure read.
    ///
    /// Rejects a negative or non-finite estimate as [`Error::InvalidUsage`].
    pub fn check_budget(
        &self,
        estimated_cost: f64,
        override_budget: bool,
    ) -> Result<BudgetDecision> {
        budget::check(&self.ledger, estimated_cost, override_budget, Utc::now())
    }

    /// Set or clear the daily spend limit and persist
    pub fn set_daily_budget(&mut self, amount: Option<f64>) -> Result<()> {
        validate_budget(amount)?;

        let mut next = self.ledger.clone();
        next.daily_budget = amount;
        next.last_updated = Utc::now();
        self.store.save(&next)?;
        self.ledger = next;
        Ok(())
    }

    /// Set or clear the monthly spend limit and persist
    pub fn set_monthly_budget(&mut self, amount: Option<f64>) -> Result<()> {
        validate_budget(amount)?;

        let mut next = self.ledger.clone();
        next.monthly_budget = amount;
        next.last_updated = Utc::now();
        self.store.save(&next)?;
        self.ledger = next;
        Ok(())
    }

    /// Aggregate records from `since` to now
    #[must_use]
    pub fn summarize(&self, since: DateTime<Utc>) -> UsageSummary {
        summarize(&self.ledger, since, Utc::now())
    }

    /// Aggregate the last `days` days
    #[must_use]
    pub fn summarize_days(&self, days: u32) -> UsageSummary {
        let now = Utc::now();
        summarize(&self.ledger, now - Duration::days(i64::from(days)), now)
    }

    /// Serialize records from `since` in the requested format. Pure read.
    pub fn export(&self, format: ExportFormat, since: DateTime<Utc>) -> Result<Vec<u8>> {
        export::render(&self.ledger, format, since, Utc::now())
    }

    /// Serialize the last `days` days in the requested format
    pub fn export_days(&self, format: ExportFormat, days: u32) -> Result<Vec<u8>> {
        let now = Utc::now();
        export::render(&self.ledger, format, now - Duration::days(i64::from(days)), now)
    }
}

fn validate_budget(amount: Option<f64>) -> Result<()> {
    if let Some(value) = amount {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidUsage(format!(
                "budget must be a non-negative amount, got {value}"
            )));
        }
    }
    Ok(())
}
