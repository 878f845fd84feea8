//! Budget guard
//!
//! Pre-flight check comparing projected spend against the configured daily
//! and monthly limits. Pure read over the ledger; never mutates.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::ledger::UsageLedger;

/// Fraction of a limit at which a soft warning is raised
pub const WARN_THRESHOLD: f64 = 0.8;

/// Outcome of a budget check
#[derive(Debug, Clone)]
pub struct BudgetDecision {
    /// Whether the pending operation may proceed
    pub allowed: bool,
    /// Human-readable warnings, in the order the limits were evaluated
    pub warnings: Vec<String>,
}

impl BudgetDecision {
    /// Allowed with nothing to report
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.allowed && self.warnings.is_empty()
    }
}

/// Evaluate a pending spend against both limits.
///
/// The estimate must be finite and non-negative; anything else fails with
/// [`Error::InvalidUsage`] before any limit is consulted (a NaN compares
/// false against every threshold and would disarm the guard entirely).
/// A limit is only enforced when set. Exceeding a limit blocks the operation
/// unless `override_budget` is passed (the warning is kept either way);
/// crossing [`WARN_THRESHOLD`] of a limit adds a soft warning without
/// blocking. With no limits configured the decision is always clean.
pub fn check(
    ledger: &UsageLedger,
    estimated_cost: f64,
    override_budget: bool,
    now: DateTime<Utc>,
) -> Result<BudgetDecision> {
    if !estimated_cost.is_finite() || estimated_cost < 0.0 {
        return Err(Error::InvalidUsage(format!(
            "estimated cost must be a non-negative amount, got {estimated_cost}"
        )));
    }

    let mut allowed = true;
    let mut warnings = Vec::new();

    if let Some(limit) = ledger.daily_budget {
        allowed &= check_window(
            "daily",
            ledger.spent_today(now),
            limit,
            estimated_cost,
            override_budget,
            &mut warnings,
        );
    }

    if let Some(limit) = ledger.monthly_budget {
        allowed &= check_window(
            "monthly",
            ledger.spent_this_month(now),
            limit,
            estimated_cost,
            override_budget,
            &mut warnings,
        );
    }

    Ok(BudgetDecision { allowed, warnings })
}

/// Returns whether the operation may proceed under this one limit.
fn check_window(
    period: &str,
    spent: f64,
    limit: f64,
    estimated_cost: f64,
    override_budget: bool,
    warnings: &mut Vec<String>,
) -> bool {
    let projected = spent + estimated_cost;

    if projected > limit {
        warnings.push(format!(
            "{period} budget exceeded by ${:.2} (${projected:.2} of ${limit:.2})",
            projected - limit
        ));
        return override_budget;
    }

    if projected > WARN_THRESHOLD * limit {
        warnings.push(format!(
            "approaching {period} budget: {:.0}% used (${projected:.2} of ${limit:.2})",
            projected / limit * 100.0
        ));
    }

    true
}
