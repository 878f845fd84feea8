//! Customize CLI command
//!
//! `tailor customize` - Run the agent-driven resume customization and record
//! its token usage in the cost ledger.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use tailor_agent::{ClaudeCodeAgent, CustomizeRequest, Customizer, Settings};
use tailor_ledger::{CostTracker, OperationKind};

use super::{CustomizeArgs, DEFAULT_COST_ESTIMATE};

/// Run the customize command
pub async fn run(mut tracker: CostTracker, args: CustomizeArgs) -> Result<()> {
    // Budget preflight before anything is spent on the agent.
    let decision = tracker.check_budget(DEFAULT_COST_ESTIMATE, args.force)?;
    for warning in &decision.warnings {
        println!("⚠️  {warning}");
    }
    if !decision.allowed {
        println!("❌ Budget limit reached. Rerun with --force to override.");
        std::process::exit(1);
    }

    let settings = Settings::from_env()?;
    let agent = ClaudeCodeAgent::from_settings(&settings);
    let customizer =
        Customizer::new(agent, settings).with_progress(Arc::new(|stage| println!("→ {stage}")));

    let outcome = customizer
        .run(CustomizeRequest {
            resume_path: args.resume,
            job_path: args.job,
            output_path: args.output,
            iterations: args.iterations,
        })
        .await?;

    if let Some(reported) = outcome.reported_cost {
        debug!(reported_cost = reported, "agent-reported cost");
    }

    let recorded = tracker.record(
        &outcome.model,
        outcome.input_tokens,
        outcome.output_tokens,
        OperationKind::Customization,
    );

    println!();
    println!("✓ Success!");
    println!(
        "Customized resume saved to: {}",
        outcome.output_path.display()
    );

    match recorded {
        Ok(entry) => {
            println!(
                "Cost: ${:.4} ({} input + {} output tokens, {} agent turns)",
                entry.cost, outcome.input_tokens, outcome.output_tokens, outcome.num_turns
            );
            let after = tracker.check_budget(0.0, false)?;
            for warning in &after.warnings {
                println!("⚠️  {warning}");
            }
        }
        Err(e) => {
            warn!(error = %e, "usage was not recorded");
            println!("⚠️  Usage was not recorded: {e}");
        }
    }

    Ok(())
}
