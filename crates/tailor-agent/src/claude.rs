//! Claude Code subprocess invoker
//!
//! Drives the `claude` CLI in headless print mode (`-p --output-format
//! stream-json`) and parses the stream for the terminal result message. The
//! agent reads the input files and writes the customized resume through its
//! own tools; this module only transports the prompt in and the usage
//! accounting out.

use std::process::Stdio;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::invoker::{AgentInvoker, AgentOutcome, AgentRequest};
use crate::settings::Settings;

/// Headless Claude Code invoker
#[derive(Debug, Clone)]
pub struct ClaudeCodeAgent {
    binary: String,
}

impl Default for ClaudeCodeAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaudeCodeAgent {
    /// Create an invoker using the `claude` executable from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: "claude".to_string(),
        }
    }

    /// Use the executable configured in [`Settings`]
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            binary: settings.claude_binary.clone(),
        }
    }

    /// Override the executable name or path
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    async fn run(&self, request: &AgentRequest) -> Result<AgentOutcome> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-p")
            .arg(&request.prompt)
            .arg("--output-format")
            .arg("stream-json")
            .arg("--verbose")
            .arg("--model")
            .arg(&request.model)
            .arg("--max-turns")
            .arg(request.max_turns.to_string());
        if !request.allowed_tools.is_empty() {
            cmd.arg("--allowedTools")
                .arg(request.allowed_tools.join(","));
        }
        if let Some(dir) = &request.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            binary = %self.binary,
            model = %request.model,
            max_turns = request.max_turns,
            "Spawning agent process"
        );

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::Spawn(format!("could not start {}: {e}", self.binary)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Spawn("agent stdout was not captured".to_string()))?;

        // Drain stderr on the side so a chatty agent cannot block on a full pipe.
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_string(&mut buf).await;
            }
            buf
        });

        let mut reported_model: Option<String> = None;
        let mut result: Option<Box<ResultMessage>> = None;
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match classify_line(&line) {
                Some(StreamEvent::Model(model)) => reported_model = Some(model),
                Some(StreamEvent::Result(message)) => result = Some(message),
                Some(StreamEvent::Chatter) => {}
                None => debug!(line = %truncate(&line, 120), "Ignoring unparseable stream line"),
            }
        }

        let status = child.wait().await?;
        let stderr_text = stderr_task.await.unwrap_or_default();

        match result {
            Some(message) => outcome_from_result(*message, reported_model, &request.model),
            None => {
                warn!(%status, "Agent exited without a result message");
                Err(Error::Agent {
                    message: format!(
                        "agent exited ({status}) without a result message: {}",
                        truncate(stderr_text.trim(), 400)
                    ),
                    retryable: true,
                })
            }
        }
    }
}

#[async_trait::async_trait]
impl AgentInvoker for ClaudeCodeAgent {
    fn name(&self) -> &str {
        "claude-code"
    }

    async fn invoke(&self, request: AgentRequest) -> Result<AgentOutcome> {
        let limit = request.timeout;
        // kill_on_drop reaps the child when the timeout cancels the run future
        match tokio::time::timeout(limit, self.run(&request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::Timeout(limit.as_secs())),
        }
    }
}

// ============================================================================
// Stream parsing
// ============================================================================

/// Minimal view of any stream-json line
#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    #[serde(rename = "type")]
    kind: String,
    /// Present on the `system` init message
    model: Option<String>,
}

/// Terminal `"type":"result"` message
#[derive(Debug, Clone, Deserialize)]
struct ResultMessage {
    subtype: Option<String>,
    #[serde(default)]
    is_error: bool,
    #[serde(default)]
    num_turns: u32,
    #[serde(default)]
    duration_ms: u64,
    total_cost_usd: Option<f64>,
    usage: Option<ResultUsage>,
    result: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResultUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

enum StreamEvent {
    /// `system` init message announced the serving model
    Model(String),
    /// Terminal result message
    Result(Box<ResultMessage>),
    /// Assistant/user/tool traffic we do not consume
    Chatter,
}

fn classify_line(line: &str) -> Option<StreamEvent> {
    let envelope: StreamEnvelope = serde_json::from_str(line).ok()?;
    Some(match envelope.kind.as_str() {
        "result" => StreamEvent::Result(Box::new(serde_json::from_str(line).ok()?)),
        _ => match envelope.model {
            Some(model) => StreamEvent::Model(model),
            None => StreamEvent::Chatter,
        },
    })
}

fn outcome_from_result(
    message: ResultMessage,
    reported_model: Option<String>,
    requested_model: &str,
) -> Result<AgentOutcome> {
    let subtype = message.subtype.as_deref().unwrap_or("");
    if message.is_error || subtype != "success" {
        let detail = message
            .result
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| {
                if subtype.is_empty() {
                    "agent reported an unnamed failure".to_string()
                } else {
                    format!("agent reported {subtype}")
                }
            });
        return Err(Error::Agent {
            message: detail,
            retryable: subtype == "error_during_execution",
        });
    }

    let usage = message.usage.ok_or_else(|| {
        Error::InvalidResponse("result message carried no usage counts".to_string())
    })?;

    Ok(AgentOutcome {
        model: reported_model.unwrap_or_else(|| requested_model.to_string()),
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
        num_turns: message.num_turns,
        duration_ms: message.duration_ms,
        reported_cost: message.total_cost_usd,
        result: message.result.unwrap_or_default(),
    })
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SUCCESS_LINE: &str = r#"{"type":"result","subtype":"success","is_error":false,"duration_ms":45231,"num_turns":12,"result":"Customized resume written to /work/out.md","total_cost_usd":0.8412,"usage":{"input_tokens":183422,"output_tokens":9877}}"#;

    fn result_from(line: &str) -> ResultMessage {
        match classify_line(line) {
            Some(StreamEvent::Result(message)) => *message,
            other => panic!(
                "expected a result event, got {:?}",
                other.map(|_| "non-result")
            ),
        }
    }

    #[test]
    fn test_classify_system_init_announces_model() {
        let line = r#"{"type":"system","subtype":"init","model":"claude-sonnet-4-20250514","tools":["Read","Write"]}"#;
        match classify_line(line) {
            Some(StreamEvent::Model(model)) => assert_eq!(model, "claude-sonnet-4-20250514"),
            _ => panic!("expected a model event"),
        }
    }

    #[test]
    fn test_classify_assistant_traffic_is_chatter() {
        let line = r#"{"type":"assistant","message":{"role":"assistant","content":[{"type":"text","text":"Reading the resume now."}]}}"#;
        assert!(matches!(classify_line(line), Some(StreamEvent::Chatter)));
    }

    #[test]
    fn test_classify_junk_line_is_none() {
        assert!(classify_line("partial json {").is_none());
        assert!(classify_line("\"just a string\"").is_none());
    }

    #[test]
    fn test_success_result_parses_usage_and_turns() {
        let outcome = outcome_from_result(
            result_from(SUCCESS_LINE),
            Some("claude-sonnet-4-20250514".to_string()),
            "claude-sonnet-4-0",
        )
        .unwrap();

        assert_eq!(outcome.model, "claude-sonnet-4-20250514");
        assert_eq!(outcome.input_tokens, 183_422);
        assert_eq!(outcome.output_tokens, 9_877);
        assert_eq!(outcome.num_turns, 12);
        assert_eq!(outcome.duration_ms, 45_231);
        assert!((outcome.reported_cost.unwrap() - 0.8412).abs() < 1e-9);
        assert!(outcome.result.contains("/work/out.md"));
    }

    #[test]
    fn test_requested_model_used_when_stream_names_none() {
        let outcome = outcome_from_result(result_from(SUCCESS_LINE), None, "claude-sonnet-4-0")
            .unwrap();
        assert_eq!(outcome.model, "claude-sonnet-4-0");
    }

    #[test]
    fn test_max_turns_failure_is_not_retryable() {
        let line = r#"{"type":"result","subtype":"error_max_turns","is_error":true,"num_turns":30,"duration_ms":120000}"#;
        let err = outcome_from_result(result_from(line), None, "m").unwrap_err();
        match err {
            Error::Agent { message, retryable } => {
                assert!(message.contains("error_max_turns"));
                assert!(!retryable);
            }
            other => panic!("expected an agent error, got {other:?}"),
        }
    }

    #[test]
    fn test_execution_failure_is_retryable() {
        let line = r#"{"type":"result","subtype":"error_during_execution","is_error":true,"num_turns":4,"duration_ms":9000,"result":"tool crashed"}"#;
        let err = outcome_from_result(result_from(line), None, "m").unwrap_err();
        match err {
            Error::Agent { message, retryable } => {
                assert_eq!(message, "tool crashed");
                assert!(retryable);
            }
            other => panic!("expected an agent error, got {other:?}"),
        }
    }

    #[test]
    fn test_success_without_usage_is_invalid_response() {
        let line = r#"{"type":"result","subtype":"success","is_error":false,"num_turns":2,"duration_ms":500,"result":"done"}"#;
        let err = outcome_from_result(result_from(line), None, "m").unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 2), "he");
        assert_eq!(truncate("héllo", 2), "hé");
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let agent = ClaudeCodeAgent::new().with_binary("tailor-no-such-binary-48151623");
        let request = AgentRequest {
            prompt: "hello".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            max_turns: 1,
            allowed_tools: vec!["Read".to_string()],
            working_dir: None,
            timeout: Duration::from_secs(5),
        };

        let err = agent.invoke(request).await.unwrap_err();
        assert!(matches!(err, Error::Spawn(_)));
    }
}
