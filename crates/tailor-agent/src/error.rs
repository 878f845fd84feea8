//! Error types for tailor-agent

use thiserror::Error;

/// Agent invocation error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration missing or out of range
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller-supplied input failed validation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Agent process could not be started
    #[error("failed to spawn agent: {0}")]
    Spawn(String),

    /// The agent ran but reported a failure
    #[error("agent failure: {message}")]
    Agent {
        /// Failure description from the agent
        message: String,
        /// Whether another attempt may succeed
        retryable: bool,
    },

    /// Wall-clock limit exceeded
    #[error("agent timed out after {0}s")]
    Timeout(u64),

    /// Agent output could not be interpreted
    #[error("invalid agent response: {0}")]
    InvalidResponse(String),

    /// I/O failure while driving the agent process
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a retry has a chance of succeeding
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Agent { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
