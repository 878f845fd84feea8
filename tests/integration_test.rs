//! Integration tests for Tailor
//!
//! These tests verify the integration between the crates:
//! - tailor-agent: customization driver, retry loop, and mock agent
//! - tailor-ledger: cost tracking, budget guard, and export

use std::fs;
use std::time::Duration;

use tailor_agent::{AgentOutcome, CustomizeRequest, Customizer, Error, MockAgent, Settings};
use tailor_ledger::{
    CostTracker, ExportDocument, ExportFormat, LedgerStore, ModelPricing, OperationKind,
    PricingTable,
};
use tempfile::TempDir;

fn test_settings() -> Settings {
    Settings::new("sk-test-key").with_retry_delay(Duration::from_millis(1))
}

fn open_tracker(dir: &TempDir) -> CostTracker {
    let store = LedgerStore::with_path(dir.path().join("costs.json"));
    let pricing = PricingTable::empty().with_model(ModelPricing::new("mock-model", 3.0, 15.0));
    CostTracker::open(store)
        .expect("open tracker")
        .with_pricing(pricing)
}

fn write_inputs(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let resume = dir.path().join("resume.md");
    let job = dir.path().join("job.md");
    fs::write(&resume, "# Jane Doe\nRust engineer, 8 years.").unwrap();
    fs::write(&job, "Senior Rust Engineer at Acme.").unwrap();
    (resume, job)
}

// ============================================================================
// Customization Flow Tests
// ============================================================================

#[tokio::test]
async fn test_customization_usage_flows_into_the_ledger() {
    let dir = TempDir::new().unwrap();
    let mut tracker = open_tracker(&dir);
    let (resume, job) = write_inputs(&dir);

    let agent = MockAgent::new();
    agent.push_outcome(AgentOutcome {
        model: "mock-model".to_string(),
        input_tokens: 2_000_000,
        output_tokens: 1_000_000,
        num_turns: 4,
        duration_ms: 1_234,
        reported_cost: Some(21.0),
        result: "wrote the customized resume".to_string(),
    });

    let customizer = Customizer::new(agent, test_settings());
    let outcome = customizer
        .run(CustomizeRequest {
            resume_path: resume,
            job_path: job,
            output_path: Some(dir.path().join("out/customized.md")),
            iterations: Some(2),
        })
        .await
        .unwrap();

    let entry = tracker
        .record(
            &outcome.model,
            outcome.input_tokens,
            outcome.output_tokens,
            OperationKind::Customization,
        )
        .unwrap();

    // $3/1M * 2M input + $15/1M * 1M output
    assert!((entry.cost - 21.0).abs() < 1e-9);
    assert_eq!(tracker.ledger().calls.len(), 1);

    // The append persisted before returning; a fresh handle sees it.
    let reopened =
        CostTracker::open(LedgerStore::with_path(dir.path().join("costs.json"))).unwrap();
    assert_eq!(reopened.ledger().calls.len(), 1);
    assert!((reopened.ledger().total_cost() - 21.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_transient_agent_failure_is_retried_then_recorded() {
    let dir = TempDir::new().unwrap();
    let mut tracker = open_tracker(&dir);
    let (resume, job) = write_inputs(&dir);

    let agent = MockAgent::new();
    agent.push_failure(Error::Timeout(1));
    agent.push_outcome(AgentOutcome {
        model: "mock-model".to_string(),
        input_tokens: 10_000,
        output_tokens: 2_000,
        num_turns: 2,
        duration_ms: 50,
        reported_cost: None,
        result: "ok".to_string(),
    });

    let customizer = Customizer::new(agent.clone(), test_settings());
    let outcome = customizer
        .run(CustomizeRequest {
            resume_path: resume,
            job_path: job,
            output_path: Some(dir.path().join("customized.md")),
            iterations: None,
        })
        .await
        .unwrap();

    assert_eq!(agent.invocations(), 2);

    tracker
        .record(
            &outcome.model,
            outcome.input_tokens,
            outcome.output_tokens,
            OperationKind::Customization,
        )
        .unwrap();
    assert_eq!(tracker.ledger().calls.len(), 1);
    assert!((tracker.ledger().total_cost() - 0.06).abs() < 1e-9);
}

// ============================================================================
// Budget Guard Tests
// ============================================================================

#[test]
fn test_budget_guard_sees_recorded_spend() {
    let dir = TempDir::new().unwrap();
    let mut tracker = open_tracker(&dir);
    tracker.set_daily_budget(Some(25.0)).unwrap();

    // $21 of the $25 daily limit
    tracker
        .record("mock-model", 2_000_000, 1_000_000, OperationKind::Analysis)
        .unwrap();

    let over = tracker.check_budget(5.0, false).unwrap();
    assert!(!over.allowed);

    let overridden = tracker.check_budget(5.0, true).unwrap();
    assert!(overridden.allowed);
    assert!(!overridden.warnings.is_empty());

    let near = tracker.check_budget(0.5, false).unwrap();
    assert!(near.allowed);
    assert!(near.warnings.iter().any(|w| w.contains("approaching")));
}

// ============================================================================
// Export Tests
// ============================================================================

#[test]
fn test_export_reflects_recorded_history() {
    let dir = TempDir::new().unwrap();
    let mut tracker = open_tracker(&dir);

    tracker
        .record("mock-model", 500_000, 100_000, OperationKind::Analysis)
        .unwrap();
    tracker
        .record("mock-model", 800_000, 200_000, OperationKind::Customization)
        .unwrap();
    tracker
        .record("mock-model", 200_000, 50_000, OperationKind::Optimization)
        .unwrap();

    let json = tracker.export_days(ExportFormat::Json, 7).unwrap();
    let document: ExportDocument = serde_json::from_slice(&json).unwrap();
    assert_eq!(document.calls.len(), 3);
    assert_eq!(document.summary.total_calls, 3);
    assert!((document.summary.total_cost - tracker.ledger().total_cost()).abs() < 1e-9);
    assert_eq!(document.summary.by_operation.len(), 3);

    let csv = tracker.export_days(ExportFormat::Csv, 7).unwrap();
    let text = String::from_utf8(csv).unwrap();
    assert_eq!(text.lines().count(), 4); // header + one row per record
}
