//! Customization orchestration
//!
//! Validates the caller's inputs, assembles the orchestration prompt, runs
//! the agent with retry, and reports progress stages along the way. All
//! substantive resume work happens inside the agent; the output file is
//! written by the agent's own tools.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::invoker::{AgentInvoker, AgentRequest};
use crate::prompt::build_orchestrator_prompt;
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::settings::Settings;

/// Tools the agent needs for a customization run
pub const DEFAULT_ALLOWED_TOOLS: &[&str] = &["Read", "Write", "Edit"];

/// Progress stages surfaced to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Input files are being checked
    Validating,
    /// The orchestration prompt is being assembled
    Preparing,
    /// The agent is working
    Running,
    /// The run finished
    Completed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Validating => "Validating input files",
            Self::Preparing => "Preparing orchestration prompt",
            Self::Running => "Customizing with the agent",
            Self::Completed => "Customization complete",
        };
        f.write_str(text)
    }
}

/// Callback invoked as the run moves between stages
pub type ProgressCallback = Arc<dyn Fn(Stage) + Send + Sync>;

/// What the caller asked for
#[derive(Debug, Clone)]
pub struct CustomizeRequest {
    /// Path to the resume to customize
    pub resume_path: PathBuf,
    /// Path to the job description
    pub job_path: PathBuf,
    /// Where the customized resume should land; defaults to
    /// `customized_<timestamp>.md` in the current directory
    pub output_path: Option<PathBuf>,
    /// Refinement pass override; defaults to the configured count
    pub iterations: Option<u32>,
}

/// Result of a completed customization run
#[derive(Debug, Clone)]
pub struct CustomizeOutcome {
    /// Where the agent was told to write the resume
    pub output_path: PathBuf,
    /// Model that served the run
    pub model: String,
    /// Input tokens consumed
    pub input_tokens: u64,
    /// Output tokens produced
    pub output_tokens: u64,
    /// Agentic turns taken
    pub num_turns: u32,
    /// Wall-clock duration reported by the agent
    pub duration_ms: u64,
    /// Cost the agent reported for itself, when available
    pub reported_cost: Option<f64>,
}

/// Orchestrates one customization run over an injected agent invoker.
pub struct Customizer<A> {
    invoker: A,
    settings: Settings,
    progress: Option<ProgressCallback>,
}

impl<A: AgentInvoker> Customizer<A> {
    /// Create a customizer over the given invoker and settings
    pub fn new(invoker: A, settings: Settings) -> Self {
        Self {
            invoker,
            settings,
            progress: None,
        }
    }

    /// Install a progress callback
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    fn report(&self, stage: Stage) {
        if let Some(callback) = &self.progress {
            callback(stage);
        }
    }

    /// Run one customization to completion.
    pub async fn run(&self, request: CustomizeRequest) -> Result<CustomizeOutcome> {
        self.report(Stage::Validating);
        let resume_path = existing_file(&request.resume_path, "resume")?;
        let job_path = existing_file(&request.job_path, "job description")?;

        let output_path = request.output_path.unwrap_or_else(default_output_path);
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        // The agent resolves paths against its own working directory, so the
        // output path it receives has to be absolute.
        let output_path = absolute(output_path)?;

        self.report(Stage::Preparing);
        let iterations = request.iterations.unwrap_or(self.settings.max_iterations);
        let prompt = build_orchestrator_prompt(&resume_path, &job_path, &output_path, iterations);

        info!(
            invoker = self.invoker.name(),
            resume = %resume_path.display(),
            job = %job_path.display(),
            output = %output_path.display(),
            iterations,
            "Starting customization"
        );

        self.report(Stage::Running);
        let agent_request = AgentRequest {
            prompt,
            model: self.settings.model.clone(),
            max_turns: self.settings.max_turns,
            allowed_tools: DEFAULT_ALLOWED_TOOLS
                .iter()
                .map(|tool| (*tool).to_string())
                .collect(),
            working_dir: None,
            timeout: self.settings.timeout,
        };
        let retry = RetryConfig::new()
            .with_max_attempts(self.settings.max_retries + 1)
            .with_initial_delay(self.settings.retry_delay);
        let outcome =
            retry_with_backoff(&retry, || self.invoker.invoke(agent_request.clone())).await?;

        if !output_path.exists() {
            warn!(path = %output_path.display(), "Agent finished without creating the output file");
        }

        self.report(Stage::Completed);
        info!(
            model = %outcome.model,
            input_tokens = outcome.input_tokens,
            output_tokens = outcome.output_tokens,
            num_turns = outcome.num_turns,
            "Customization finished"
        );

        Ok(CustomizeOutcome {
            output_path,
            model: outcome.model,
            input_tokens: outcome.input_tokens,
            output_tokens: outcome.output_tokens,
            num_turns: outcome.num_turns,
            duration_ms: outcome.duration_ms,
            reported_cost: outcome.reported_cost,
        })
    }
}

fn existing_file(path: &Path, what: &str) -> Result<PathBuf> {
    if !path.exists() {
        return Err(Error::InvalidInput(format!(
            "{what} file not found: {}",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(Error::InvalidInput(format!(
            "{what} path is not a file: {}",
            path.display()
        )));
    }
    Ok(path.canonicalize()?)
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from(format!(
        "customized_{}.md",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}
