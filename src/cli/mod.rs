//! CLI module for Tailor
//!
//! Provides the user-facing commands:
//! - `customize`: agent-driven resume customization
//! - `cost`: usage ledger inspection and budget management

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use tailor_ledger::{CostTracker, LedgerStore};

pub mod cost;
pub mod customize;

/// Placeholder cost estimate for budget checks made before any tokens are
/// spent, when the real usage of the pending call is unknowable.
pub const DEFAULT_COST_ESTIMATE: f64 = 0.01;

/// Tailor resume customizer CLI
#[derive(Parser, Debug)]
#[command(name = "tailor")]
#[command(about = "AI-powered resume customization with usage and budget tracking")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Customize a resume for a specific job description
    Customize(CustomizeArgs),
    /// Track API spend and manage budgets
    Cost {
        #[command(subcommand)]
        command: CostCommands,
    },
}

/// Arguments for `tailor customize`
#[derive(Args, Debug)]
pub struct CustomizeArgs {
    /// Path to the resume file (markdown or plain text)
    #[arg(short, long)]
    pub resume: PathBuf,

    /// Path to the job description file
    #[arg(short, long)]
    pub job: PathBuf,

    /// Output path for the customized resume (default: customized_<timestamp>.md)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Refinement passes over the draft
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub iterations: Option<u32>,

    /// Proceed even when a budget limit would be exceeded
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand, Debug)]
pub enum CostCommands {
    /// Show current spend and budget status
    Status {
        /// Machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Set or clear the daily/monthly budget limits
    SetBudget {
        /// Daily limit in USD
        #[arg(long)]
        daily: Option<f64>,
        /// Monthly limit in USD
        #[arg(long)]
        monthly: Option<f64>,
        /// Remove the daily limit
        #[arg(long, conflicts_with = "daily")]
        clear_daily: bool,
        /// Remove the monthly limit
        #[arg(long, conflicts_with = "monthly")]
        clear_monthly: bool,
    },
    /// Aggregate usage over a lookback window
    Summary {
        /// Window length in days
        #[arg(long, default_value_t = 30)]
        days: u32,
        /// Machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Write usage data to a file
    Export {
        /// Export format: csv or json
        format: String,
        /// Destination file path
        path: PathBuf,
        /// Only include records from the last N days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Append a usage record by hand (testing aid)
    Record {
        /// Model identifier
        model: String,
        /// Input token count
        input_tokens: u64,
        /// Output token count
        output_tokens: u64,
        /// Operation kind: analysis, customization, or optimization
        #[arg(long, default_value = "customization")]
        operation: String,
    },
    /// Check whether a pending spend fits the configured budgets
    Check {
        /// Estimated cost of the pending call in USD
        #[arg(long)]
        estimate: Option<f64>,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Customize(args)) => {
            let tracker = CostTracker::open(LedgerStore::new())?;
            customize::run(tracker, args).await
        }
        Some(Commands::Cost { command }) => {
            let tracker = CostTracker::open(LedgerStore::new())?;
            cost::run(tracker, command).await
        }
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
