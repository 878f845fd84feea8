//! Model pricing - per-token cost information
//!
//! This module contains pricing for the Claude models the agent can report,
//! and the strict lookup table used for every cost computation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

// ============================================================================
// Pricing Constants (per 1M tokens, USD)
// ============================================================================

/// Claude Opus 4 input cost per 1M tokens
pub const CLAUDE_OPUS_INPUT_COST: f64 = 15.00;
/// Claude Opus 4 output cost per 1M tokens
pub const CLAUDE_OPUS_OUTPUT_COST: f64 = 75.00;
/// Claude Sonnet 4 input cost per 1M tokens
pub const CLAUDE_SONNET_INPUT_COST: f64 = 3.00;
/// Claude Sonnet 4 output cost per 1M tokens
pub const CLAUDE_SONNET_OUTPUT_COST: f64 = 15.00;
/// Claude 3.5 Haiku input cost per 1M tokens
pub const CLAUDE_HAIKU_INPUT_COST: f64 = 0.80;
/// Claude 3.5 Haiku output cost per 1M tokens
pub const CLAUDE_HAIKU_OUTPUT_COST: f64 = 4.00;

/// Decimal places kept on every computed cost
const CURRENCY_SCALE: f64 = 10_000.0;

/// Round an amount to four decimal places, ties away from zero
#[must_use]
pub fn round_currency(amount: f64) -> f64 {
    (amount * CURRENCY_SCALE).round() / CURRENCY_SCALE
}

// ============================================================================
// Cost Models
// ============================================================================

/// Pricing information for a model (per 1M tokens)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Model identifier
    pub model: String,
    /// Cost per 1M input tokens (USD)
    pub input_cost_per_million: f64,
    /// Cost per 1M output tokens (USD)
    pub output_cost_per_million: f64,
}

impl ModelPricing {
    /// Create a pricing entry
    #[must_use]
    pub fn new(
        model: impl Into<String>,
        input_cost_per_million: f64,
        output_cost_per_million: f64,
    ) -> Self {
        Self {
            model: model.into(),
            input_cost_per_million,
            output_cost_per_million,
        }
    }

    /// Cost for the given token counts, rounded to currency precision
    #[must_use]
    pub fn calculate_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        let input_cost = (input_tokens as f64 / 1_000_000.0) * self.input_cost_per_million;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * self.output_cost_per_million;
        round_currency(input_cost + output_cost)
    }
}

/// Strict pricing lookup over a model → rates table.
///
/// Lookups for unknown identifiers fail instead of falling back to a made-up
/// rate: a silently defaulted cost would corrupt budget accounting.
#[derive(Debug, Clone)]
pub struct PricingTable {
    models: HashMap<String, ModelPricing>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            models: default_pricing(),
        }
    }
}

impl PricingTable {
    /// Empty table; tests build it up with [`PricingTable::with_model`]
    #[must_use]
    pub fn empty() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Insert or replace pricing for a model
    #[must_use]
    pub fn with_model(mut self, pricing: ModelPricing) -> Self {
        self.models.insert(pricing.model.clone(), pricing);
        self
    }

    /// Look up pricing for a model
    pub fn price_for(&self, model: &str) -> Result<&ModelPricing> {
        self.models.get(model).ok_or_else(|| Error::UnknownModel {
            model: model.to_string(),
        })
    }

    /// Rounded cost for a pending or completed call
    pub fn estimate(&self, model: &str, input_tokens: u64, output_tokens: u64) -> Result<f64> {
        Ok(self.price_for(model)?.calculate_cost(input_tokens, output_tokens))
    }

    /// Known model identifiers, sorted
    #[must_use]
    pub fn known_models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = self.models.keys().map(String::as_str).collect();
        models.sort_unstable();
        models
    }
}

/// Default pricing for the models the agent reports.
///
/// Dated identifiers come back from the agent verbatim; the bare aliases are
/// what users type on the command line.
#[must_use]
pub fn default_pricing() -> HashMap<String, ModelPricing> {
    let mut pricing = HashMap::new();

    // ========================================================================
    // Anthropic Claude 4 Family
    // ========================================================================
    insert(
        &mut pricing,
        &["claude-opus-4-20250514", "claude-opus-4-0"],
        CLAUDE_OPUS_INPUT_COST,
        CLAUDE_OPUS_OUTPUT_COST,
    );
    insert(
        &mut pricing,
        &["claude-sonnet-4-20250514", "claude-sonnet-4-0"],
        CLAUDE_SONNET_INPUT_COST,
        CLAUDE_SONNET_OUTPUT_COST,
    );

    // ========================================================================
    // Anthropic Claude 3.5 Family (still available)
    // ========================================================================
    insert(
        &mut pricing,
        &["claude-3-5-sonnet-20241022", "claude-3-5-sonnet-latest"],
        3.00,
        15.00,
    );
    insert(
        &mut pricing,
        &["claude-3-5-haiku-20241022", "claude-3-5-haiku-latest"],
        CLAUDE_HAIKU_INPUT_COST,
        CLAUDE_HAIKU_OUTPUT_COST,
    );

    // ========================================================================
    // Anthropic Claude 3 Family (legacy)
    // ========================================================================
    insert(&mut pricing, &["claude-3-opus-20240229"], 15.00, 75.00);
    insert(&mut pricing, &["claude-3-sonnet-20240229"], 3.00, 15.00);
    insert(&mut pricing, &["claude-3-haiku-20240307"], 0.25, 1.25);

    pricing
}

fn insert(
    pricing: &mut HashMap<String, ModelPricing>,
    ids: &[&str],
    input_cost_per_million: f64,
    output_cost_per_million: f64,
) {
    for id in ids {
        pricing.insert(
            (*id).to_string(),
            ModelPricing::new(*id, input_cost_per_million, output_cost_per_million),
        );
    }
}
