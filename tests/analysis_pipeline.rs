//! Analysis Pipeline Integration Tests
//!
//! Exercise the full path from collector files on disk to a finished analysis:
//! 1. JsonFileNewsSource reads collector-format snapshots
//! 2. AnalysisOrchestrator checks the backend, provisions the model, prompts
//! 3. Failures surface as typed AnalysisError kinds
//!
//! The backend is the recording fake from `ports::mocks`; no network calls.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use newsdesk::adapters::news_file::JsonFileNewsSource;
use newsdesk::application::{AnalysisOrchestrator, ProvisionPolicy};
use newsdesk::domain::{AnalysisErrorKind, ModelSpec, NewsSnapshot};
use newsdesk::ports::mocks::{BackendCall, GenerateBehavior, MockBackend};
use newsdesk::ports::NewsSourcePort;

// ============================================================================
// Test Fixtures
// ============================================================================

const HOST: &str = "http://localhost:11434";
const MODEL: &str = "deepseek-r1:7b";

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/news")
}

fn instant_policy() -> ProvisionPolicy {
    ProvisionPolicy {
        poll_attempts: 3,
        poll_interval: Duration::ZERO,
        max_poll_interval: Duration::ZERO,
    }
}

fn orchestrator_for(mock: &MockBackend) -> AnalysisOrchestrator {
    AnalysisOrchestrator::new(Arc::new(mock.clone()), ModelSpec::new(MODEL, HOST))
        .with_provision_policy(instant_policy())
}

fn sent_prompt(mock: &MockBackend) -> String {
    mock.calls()
        .into_iter()
        .find_map(|call| match call {
            BackendCall::Generate { prompt, .. } => Some(prompt),
            _ => None,
        })
        .expect("no generate call recorded")
}

// ============================================================================
// Snapshot Loading
// ============================================================================

#[test]
fn test_fixture_uses_collector_field_names() {
    let source = JsonFileNewsSource::new(fixture_dir());
    let snapshot: NewsSnapshot =
        tokio_test::block_on(source.by_date("2024-03-15")).expect("fixture should load");

    assert_eq!(snapshot.categories, vec!["earnings", "macro"]);
    assert_eq!(snapshot.total_articles(), 3);
    assert!(snapshot.validate().is_ok());

    let counts = snapshot.sentiment_counts();
    assert_eq!((counts.positive, counts.neutral, counts.negative), (1, 1, 1));
}

#[tokio::test]
async fn test_latest_fixture_is_newest() {
    let source = JsonFileNewsSource::new(fixture_dir());
    let snapshot = source.latest().await.unwrap();
    assert_eq!(snapshot.date, "2024-03-15");
}

// ============================================================================
// End-to-End Analysis
// ============================================================================

#[tokio::test]
async fn test_analyze_fixture_with_resident_model() {
    let mock = MockBackend::new()
        .with_model(MODEL)
        .with_response("Semiconductors lead; rates are a headwind.");
    let orchestrator = orchestrator_for(&mock);
    let source = JsonFileNewsSource::new(fixture_dir());

    let result = orchestrator
        .analyze_from_source(&source, Some("2024-03-15"), Some("chip stocks"), orchestrator.default_model())
        .await
        .unwrap();

    assert_eq!(result.date, "2024-03-15");
    assert_eq!(result.model, MODEL);
    assert_eq!(result.text, "Semiconductors lead; rates are a headwind.");
    assert_eq!(mock.pull_count(), 0);

    let prompt = sent_prompt(&mock);
    assert!(prompt.starts_with("Based on the following financial news:\n\n"));
    assert!(prompt.contains("Financial News Analysis for 2024-03-15\n\n"));
    assert!(prompt.contains("\nEARNINGS NEWS:\n"));
    assert!(prompt.contains("  Related Stocks: NVDA, AMD\n"));
    assert!(prompt.contains("- Retailer trims full-year outlook\n  Time: 2024-03-15 08:10\n\n"));
    assert!(prompt.ends_with("\nSpecific focus on: chip stocks"));
    assert!(
        prompt.find("EARNINGS NEWS").unwrap() < prompt.find("MACRO NEWS").unwrap(),
        "categories must follow the snapshot order"
    );
}

#[tokio::test]
async fn test_analyze_pulls_missing_model_first() {
    let mock = MockBackend::new()
        .with_pull_ready_after(Some(1))
        .with_generate(GenerateBehavior::EchoModel);
    let orchestrator = orchestrator_for(&mock);
    let source = JsonFileNewsSource::new(fixture_dir());

    let result = orchestrator
        .analyze_from_source(&source, None, None, orchestrator.default_model())
        .await
        .unwrap();

    assert_eq!(result.text, format!("analysis by {}", MODEL));
    assert_eq!(mock.pull_count(), 1);

    let calls = mock.calls();
    let pull_at = calls
        .iter()
        .position(|c| matches!(c, BackendCall::Pull { .. }))
        .unwrap();
    let generate_at = calls
        .iter()
        .position(|c| matches!(c, BackendCall::Generate { .. }))
        .unwrap();
    assert!(pull_at < generate_at);
}

#[tokio::test]
async fn test_per_call_model_override() {
    let mock = MockBackend::new()
        .with_model(MODEL)
        .with_model("llama3:8b")
        .with_generate(GenerateBehavior::EchoModel);
    let orchestrator = orchestrator_for(&mock);
    let source = JsonFileNewsSource::new(fixture_dir());

    let other = orchestrator.default_model().with_name("llama3:8b");
    let overridden = orchestrator
        .analyze_from_source(&source, Some("2024-03-14"), None, &other)
        .await
        .unwrap();
    let default = orchestrator
        .analyze_from_source(&source, Some("2024-03-14"), None, orchestrator.default_model())
        .await
        .unwrap();

    assert_eq!(overridden.model, "llama3:8b");
    assert_eq!(default.model, MODEL);
}

// ============================================================================
// Failure Paths
// ============================================================================

#[tokio::test]
async fn test_backend_down_makes_no_inference_call() {
    let mock = MockBackend::unreachable();
    let orchestrator = orchestrator_for(&mock);
    let source = JsonFileNewsSource::new(fixture_dir());

    let err = orchestrator
        .analyze_from_source(&source, Some("2024-03-15"), None, orchestrator.default_model())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), AnalysisErrorKind::BackendDown);
    assert!(err.is_retryable());
    assert_eq!(mock.generate_count(), 0);
    assert_eq!(mock.pull_count(), 0);
}

#[tokio::test]
async fn test_unknown_date_is_news_unavailable() {
    let mock = MockBackend::new().with_model(MODEL);
    let orchestrator = orchestrator_for(&mock);
    let source = JsonFileNewsSource::new(fixture_dir());

    let err = orchestrator
        .analyze_from_source(&source, Some("1999-01-01"), None, orchestrator.default_model())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), AnalysisErrorKind::NewsUnavailable);
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_model_never_appears_after_pull() {
    let mock = MockBackend::new().with_pull_ready_after(None);
    let orchestrator = orchestrator_for(&mock);
    let source = JsonFileNewsSource::new(fixture_dir());

    let err = orchestrator
        .analyze_from_source(&source, Some("2024-03-15"), None, orchestrator.default_model())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), AnalysisErrorKind::ModelUnavailable);
    assert!(!err.is_retryable());
    assert_eq!(mock.generate_count(), 0);
}
