//! Agent invocation boundary
//!
//! This module defines the capability trait the customizer depends on. The
//! production implementation drives a Claude Code subprocess; tests substitute
//! [`crate::mock::MockAgent`].

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;

/// One complete request to the agent
#[derive(Debug, Clone)]
pub struct AgentRequest {
    /// Full orchestration prompt
    pub prompt: String,
    /// Model identifier to request
    pub model: String,
    /// Upper bound on agentic turns
    pub max_turns: u32,
    /// Tools the agent is allowed to use
    pub allowed_tools: Vec<String>,
    /// Working directory for the agent process
    pub working_dir: Option<PathBuf>,
    /// Wall-clock limit for the whole invocation
    pub timeout: Duration,
}

/// What a completed invocation reported back
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    /// Model that actually served the request
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
    /// Final result text
    pub result: String,
}

impl AgentOutcome {
    /// Combined token count
    #[must_use]
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Trait for agent invokers
#[async_trait::async_trait]
pub trait AgentInvoker: Send + Sync {
    /// Get the invoker name
    fn name(&self) -> &str;

    /// Run one request to completion
    async fn invoke(&self, request: AgentRequest) -> Result<AgentOutcome>;
}
