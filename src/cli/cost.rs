//! Cost CLI commands
//!
//! `tailor cost` - Inspect API spend, manage budget limits, and export the
//! usage ledger.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use tailor_ledger::{CostTracker, ExportFormat, OperationKind, UsageSummary};

use super::{CostCommands, DEFAULT_COST_ESTIMATE};

/// Run a cost subcommand
pub async fn run(mut tracker: CostTracker, cmd: CostCommands) -> Result<()> {
    match cmd {
        CostCommands::Status { json } => status(&tracker, json),
        CostCommands::SetBudget {
            daily,
            monthly,
            clear_daily,
            clear_monthly,
        } => set_budget(&mut tracker, daily, monthly, clear_daily, clear_monthly),
        CostCommands::Summary { days, json } => summary(&tracker, days, json),
        CostCommands::Export { format, path, days } => export(&tracker, &format, &path, days),
        CostCommands::Record {
            model,
            input_tokens,
            output_tokens,
            operation,
        } => record(&mut tracker, &model, input_tokens, output_tokens, &operation),
        CostCommands::Check { estimate } => check(&tracker, estimate),
    }
}

/// Show current spend against the configured budgets
fn status(tracker: &CostTracker, json: bool) -> Result<()> {
    let now = Utc::now();
    let ledger = tracker.ledger();
    let decision = tracker.check_budget(0.0, false)?;

    if json {
        let output = serde_json::json!({
            "total_cost_usd": ledger.total_cost(),
            "total_calls": ledger.calls.len(),
            "today": {
                "date": now.format("%Y-%m-%d").to_string(),
                "spent_usd": ledger.spent_today(now),
                "budget_usd": ledger.daily_budget,
            },
            "month": {
                "label": now.format("%B %Y").to_string(),
                "spent_usd": ledger.spent_this_month(now),
                "budget_usd": ledger.monthly_budget,
            },
            "warnings": decision.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("  📊 Tailor Cost Tracker");
    println!("  {}", "=".repeat(60));
    println!("  💰 Total Spent: ${:.4}", ledger.total_cost());
    println!("  📞 Total API Calls: {}", ledger.calls.len());

    println!();
    println!("  📅 Today ({}):", now.format("%Y-%m-%d"));
    print_window(ledger.spent_today(now), ledger.daily_budget);

    println!();
    println!("  📆 This Month ({}):", now.format("%B %Y"));
    print_window(ledger.spent_this_month(now), ledger.monthly_budget);

    if !decision.warnings.is_empty() {
        println!();
        println!("  ⚠️  Budget Alerts:");
        for warning in &decision.warnings {
            println!("     {warning}");
        }
    }

    let recent = tracker.summarize_days(7);
    if recent.total_calls > 0 {
        println!();
        println!("  📈 Last 7 Days:");
        println!("     API Calls: {}", recent.total_calls);
        println!("     Total Cost: ${:.4}", recent.total_cost);
        println!("     Daily Average: ${:.4}", recent.daily_average_cost);
    }

    println!("  {}", "=".repeat(60));
    println!();

    Ok(())
}

/// Set or clear budget limits; at least one flag is required
fn set_budget(
    tracker: &mut CostTracker,
    daily: Option<f64>,
    monthly: Option<f64>,
    clear_daily: bool,
    clear_monthly: bool,
) -> Result<()> {
    if daily.is_none() && monthly.is_none() && !clear_daily && !clear_monthly {
        anyhow::bail!(
            "specify at least one of --daily, --monthly, --clear-daily, --clear-monthly"
        );
    }

    if let Some(amount) = daily {
        tracker.set_daily_budget(Some(amount))?;
        println!("✅ Daily budget set to ${amount:.2}");
    }
    if clear_daily {
        tracker.set_daily_budget(None)?;
        println!("✅ Daily budget cleared");
    }
    if let Some(amount) = monthly {
        tracker.set_monthly_budget(Some(amount))?;
        println!("✅ Monthly budget set to ${amount:.2}");
    }
    if clear_monthly {
        tracker.set_monthly_budget(None)?;
        println!("✅ Monthly budget cleared");
    }

    Ok(())
}

/// Print aggregated usage over the last `days` days
fn summary(tracker: &CostTracker, days: u32, json: bool) -> Result<()> {
    let summary = tracker.summarize_days(days);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("  📊 Usage Summary - Last {days} Days");
    println!("  {}", "=".repeat(50));
    println!("  Total API Calls: {}", summary.total_calls);
    println!("  Total Cost: ${:.4}", summary.total_cost);
    println!(
        "  Total Input Tokens: {}",
        format_with_commas(summary.total_input_tokens)
    );
    println!(
        "  Total Output Tokens: {}",
        format_with_commas(summary.total_output_tokens)
    );
    println!("  Daily Average Cost: ${:.4}", summary.daily_average_cost);

    print_breakdowns(&summary);
    println!();

    Ok(())
}

/// Write the export rendering to `path`
fn export(tracker: &CostTracker, format: &str, path: &Path, days: Option<u32>) -> Result<()> {
    let format: ExportFormat = format.parse()?;

    let bytes = match days {
        Some(days) => tracker.export_days(format, days)?,
        None => {
            // Export everything by anchoring the window at the oldest record.
            let since = tracker
                .ledger()
                .calls
                .first()
                .map(|call| call.timestamp)
                .unwrap_or_else(Utc::now);
            tracker.export(format, since)?
        }
    };

    std::fs::write(path, &bytes)
        .with_context(|| format!("could not write {}", path.display()))?;

    match format {
        ExportFormat::Csv => {
            // data rows, excluding the header
            let rows = bytes
                .iter()
                .filter(|b| **b == b'\n')
                .count()
                .saturating_sub(1);
            println!("✅ Exported {rows} records to {}", path.display());
        }
        ExportFormat::Json => println!("✅ Exported data to {}", path.display()),
    }
    Ok(())
}

/// Append a usage record by hand and show any resulting budget alerts
fn record(
    tracker: &mut CostTracker,
    model: &str,
    input_tokens: u64,
    output_tokens: u64,
    operation: &str,
) -> Result<()> {
    let operation: OperationKind = operation.parse()?;
    let entry = tracker.record(model, input_tokens, output_tokens, operation)?;
    println!("✅ Recorded API call: ${:.4}", entry.cost);

    let decision = tracker.check_budget(0.0, false)?;
    if !decision.warnings.is_empty() {
        println!();
        println!("⚠️  Budget Alerts:");
        for warning in &decision.warnings {
            println!("   {warning}");
        }
    }

    Ok(())
}

/// Run the budget guard standalone; exits non-zero when the spend is blocked
fn check(tracker: &CostTracker, estimate: Option<f64>) -> Result<()> {
    let estimated_cost = estimate.unwrap_or(DEFAULT_COST_ESTIMATE);
    let decision = tracker.check_budget(estimated_cost, false)?;

    if decision.allowed {
        println!("✅ An API call of ${estimated_cost:.4} fits within the budget limits");
        for warning in &decision.warnings {
            println!("   ⚠️  {warning}");
        }
    } else {
        println!("❌ An API call of ${estimated_cost:.4} would exceed budget limits:");
        for warning in &decision.warnings {
            println!("   {warning}");
        }
        std::process::exit(1);
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────

/// Print spend, budget, and remaining for one window
fn print_window(spent: f64, budget: Option<f64>) {
    println!("     Spent: ${spent:.4}");
    match budget {
        Some(limit) => {
            let remaining = (limit - spent).max(0.0);
            let pct_left = ((1.0 - spent / limit) * 100.0).max(0.0);
            println!("     Budget: ${limit:.2}");
            println!("     Remaining: ${remaining:.2} ({pct_left:.1}% left)");
        }
        None => println!("     Budget: Not set"),
    }
}

/// Print by-model and by-operation tables in a stable order
fn print_breakdowns(summary: &UsageSummary) {
    if !summary.by_model.is_empty() {
        println!();
        println!("  By Model:");
        let mut models: Vec<_> = summary.by_model.iter().collect();
        models.sort_by(|a, b| a.0.cmp(b.0));
        for (model, stats) in models {
            println!("     {model}: {} calls, ${:.4}", stats.calls, stats.cost);
        }
    }

    if !summary.by_operation.is_empty() {
        println!();
        println!("  By Operation:");
        let mut operations: Vec<_> = summary.by_operation.iter().collect();
        operations.sort_by_key(|(op, _)| op.to_string());
        for (operation, stats) in operations {
            println!("     {operation}: {} calls, ${:.4}", stats.calls, stats.cost);
        }
    }
}

fn format_with_commas(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
