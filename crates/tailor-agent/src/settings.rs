//! Runtime configuration loaded from the environment
//!
//! All knobs have defaults except the API key; each can be overridden through
//! a `TAILOR_*` environment variable or a builder method.

use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};

const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const MODEL_ENV: &str = "TAILOR_MODEL";
const MAX_ITERATIONS_ENV: &str = "TAILOR_MAX_ITERATIONS";
const MAX_TURNS_ENV: &str = "TAILOR_MAX_TURNS";
const MAX_RETRIES_ENV: &str = "TAILOR_MAX_RETRIES";
const RETRY_DELAY_MS_ENV: &str = "TAILOR_RETRY_DELAY_MS";
const TIMEOUT_SECS_ENV: &str = "TAILOR_TIMEOUT_SECS";
const CLAUDE_BINARY_ENV: &str = "TAILOR_CLAUDE_BINARY";

/// Default model requested from the agent
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const DEFAULT_MAX_ITERATIONS: u32 = 3;
const DEFAULT_MAX_TURNS: u32 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 600;
const DEFAULT_CLAUDE_BINARY: &str = "claude";

/// Refinement iteration bounds accepted from the environment and the CLI
pub const ITERATION_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

/// Application settings for agent invocations
#[derive(Clone)]
pub struct Settings {
    /// Anthropic API key, inherited by the agent process
    pub api_key: String,
    /// Model identifier requested from the agent
    pub model: String,
    /// Refinement passes the orchestration prompt asks for
    pub max_iterations: u32,
    /// Upper bound on agentic turns per invocation
    pub max_turns: u32,
    /// Retries after the first failed attempt
    pub max_retries: u32,
    /// Initial delay between retries
    pub retry_delay: Duration,
    /// Wall-clock limit for one invocation
    pub timeout: Duration,
    /// Agent CLI executable name or path
    pub claude_binary: String,
}

// Custom Debug implementation to mask the API key
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &mask_key(&self.api_key))
            .field("model", &self.model)
            .field("max_iterations", &self.max_iterations)
            .field("max_turns", &self.max_turns)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("timeout", &self.timeout)
            .field("claude_binary", &self.claude_binary)
            .finish()
    }
}

impl Settings {
    /// Create settings with defaults and the given API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_turns: DEFAULT_MAX_TURNS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            claude_binary: DEFAULT_CLAUDE_BINARY.to_string(),
        }
    }

    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup(API_KEY_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config(format!("{API_KEY_ENV} is not set")))?;

        let model = lookup(MODEL_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let claude_binary = lookup(CLAUDE_BINARY_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CLAUDE_BINARY.to_string());

        let max_iterations = parse_var(&lookup, MAX_ITERATIONS_ENV, DEFAULT_MAX_ITERATIONS)?;
        let max_turns = parse_var(&lookup, MAX_TURNS_ENV, DEFAULT_MAX_TURNS)?;
        let max_retries = parse_var(&lookup, MAX_RETRIES_ENV, DEFAULT_MAX_RETRIES)?;
        let retry_delay_ms = parse_var(&lookup, RETRY_DELAY_MS_ENV, DEFAULT_RETRY_DELAY_MS)?;
        let timeout_secs = parse_var(&lookup, TIMEOUT_SECS_ENV, DEFAULT_TIMEOUT_SECS)?;

        if !ITERATION_RANGE.contains(&max_iterations) {
            return Err(Error::Config(format!(
                "{MAX_ITERATIONS_ENV} must be between {} and {}, got {max_iterations}",
                ITERATION_RANGE.start(),
                ITERATION_RANGE.end()
            )));
        }
        if max_turns == 0 {
            return Err(Error::Config(format!("{MAX_TURNS_ENV} must be at least 1")));
        }
        if retry_delay_ms == 0 {
            return Err(Error::Config(format!(
                "{RETRY_DELAY_MS_ENV} must be at least 1"
            )));
        }
        if timeout_secs == 0 {
            return Err(Error::Config(format!(
                "{TIMEOUT_SECS_ENV} must be at least 1"
            )));
        }

        Ok(Self {
            api_key,
            model,
            max_iterations,
            max_turns,
            max_retries,
            retry_delay: Duration::from_millis(retry_delay_ms),
            timeout: Duration::from_secs(timeout_secs),
            claude_binary,
        })
    }

    /// Set the model identifier
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the refinement iteration count
    #[must_use]
    pub fn with_max_iterations(mut self, iterations: u32) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Set the agentic turn limit
    #[must_use]
    pub fn with_max_turns(mut self, turns: u32) -> Self {
        self.max_turns = turns;
        self
    }

    /// Set the retry count
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the initial retry delay
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the invocation timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the agent CLI executable
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.claude_binary = binary.into();
        self
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{name} must be a number, got {raw:?}"))),
        None => Ok(default),
    }
}

/// Mask a key for safe display in logs: first and last four characters only
fn mask_key(key: &str) -> String {
    if key.len() <= 8 {
        return "****".to_string();
    }
    format!("{}...{}", &key[..4], &key[key.len() - 4..])
}
