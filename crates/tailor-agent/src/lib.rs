//! Tailor Agent - headless Claude Code invocation
//!
//! This crate owns the boundary between the tailor CLI and the external
//! agent that performs the actual resume work:
//! - Settings: env-derived configuration with validation
//! - Invoker: the `AgentInvoker` capability trait and its request/outcome types
//! - Claude: production invoker driving the `claude` CLI as a subprocess
//! - Mock: queued-outcome invoker for tests
//! - Retry: exponential backoff around transient agent failures
//! - Customizer: input validation, prompt assembly, progress stages
//!
//! The `{model, input_tokens, output_tokens}` triple in [`AgentOutcome`] is
//! what callers feed into cost accounting; nothing in this crate records or
//! persists usage itself.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod claude;
pub mod customizer;
pub mod error;
pub mod invoker;
pub mod mock;
pub mod prompt;
pub mod retry;
pub mod settings;

pub use claude::ClaudeCodeAgent;
pub use customizer::{
    CustomizeOutcome, CustomizeRequest, Customizer, ProgressCallback, Stage, DEFAULT_ALLOWED_TOOLS,
};
pub use error::{Error, Result};
pub use invoker::{AgentInvoker, AgentOutcome, AgentRequest};
pub use mock::MockAgent;
pub use prompt::build_orchestrator_prompt;
pub use retry::{retry_with_backoff, RetryConfig};
pub use settings::Settings;
