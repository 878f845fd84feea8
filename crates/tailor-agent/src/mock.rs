//! Mock agent invoker for testing
//!
//! Pops queued outcomes in order; an empty queue yields a deterministic
//! default success so simple tests need no setup.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::invoker::{AgentInvoker, AgentOutcome, AgentRequest};

/// A mock invoker that returns queued outcomes or a default success.
///
/// Clones share one queue and counter, so a test can keep a handle after
/// handing the mock to a [`crate::customizer::Customizer`].
#[derive(Clone)]
pub struct MockAgent {
    outcomes: Arc<Mutex<VecDeque<Result<AgentOutcome>>>>,
    invocations: Arc<AtomicU32>,
}

impl Default for MockAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAgent {
    /// Create a new mock invoker with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            invocations: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Queue a successful outcome.
    pub fn push_outcome(&self, outcome: AgentOutcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(outcome));
    }

    /// Queue a failure.
    pub fn push_failure(&self, error: Error) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(error));
    }

    /// Number of `invoke` calls so far.
    #[must_use]
    pub fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::SeqCst)
    }

    /// The outcome returned whenever the queue is empty.
    #[must_use]
    pub fn default_outcome() -> AgentOutcome {
        AgentOutcome {
            model: "mock-model".to_string(),
            input_tokens: 1_200,
            output_tokens: 800,
            num_turns: 1,
            duration_ms: 10,
            reported_cost: None,
            result: "mock result".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl AgentInvoker for MockAgent {
    fn name(&self) -> &str {
        "mock"
    }

    async fn invoke(&self, _request: AgentRequest) -> Result<AgentOutcome> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let queued = self
            .outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match queued {
            Some(outcome) => outcome,
            None => Ok(Self::default_outcome()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request() -> AgentRequest {
        AgentRequest {
            prompt: "p".to_string(),
            model: "mock-model".to_string(),
            max_turns: 1,
            allowed_tools: vec![],
            working_dir: None,
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_empty_queue_returns_default() {
        let agent = MockAgent::new();

        let outcome = agent.invoke(request()).await.unwrap();
        assert_eq!(outcome.model, "mock-model");
        assert_eq!(outcome.total_tokens(), 2_000);
        assert_eq!(agent.invocations(), 1);
    }

    #[tokio::test]
    async fn test_queued_outcomes_pop_in_order() {
        let agent = MockAgent::new();
        let mut first = MockAgent::default_outcome();
        first.result = "first".to_string();
        agent.push_outcome(first);
        agent.push_failure(Error::Timeout(5));

        assert_eq!(agent.invoke(request()).await.unwrap().result, "first");
        assert!(matches!(
            agent.invoke(request()).await.unwrap_err(),
            Error::Timeout(5)
        ));
        // Queue exhausted, back to the default
        assert_eq!(agent.invoke(request()).await.unwrap().result, "mock result");
        assert_eq!(agent.invocations(), 3);
    }
}
