//! End-to-end evaluation runs over datasets loaded from disk

use std::io::Write;
use std::sync::Arc;

use easel_core::prelude::*;
use serde_json::json;

fn write_dataset(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn routing_dataset_reports_mixed_outcomes() {
    let file = write_dataset(
        ".json",
        r#"[
            {"name": "rewrite", "inputs": {"messages": [{"content": "shorter please"}]},
             "referenceOutputs": {"next": "rewriteArtifact"}},
            {"name": "chat", "inputs": {"messages": [{"content": "hi"}]},
             "referenceOutputs": {"next": "replyToGeneralInput"}},
            {"name": "noisy", "flaky": true, "inputs": {"messages": [{"content": "hmm"}]},
             "referenceOutputs": {"next": "generateArtifact"}}
        ]"#,
    );
    let dataset = Dataset::load(file.path()).unwrap();

    let engine = StubNodeEngine::new().with_node(
        "generatePath",
        StubNodeResponse::success(json!({"next": "rewriteArtifact"})),
    );
    let runner = EvalCaseRunner::new(Arc::new(engine), &EvalConfig::default());

    let records = runner.run_all(&dataset.cases, EvalMode::Routing).await.unwrap();
    let report = EvalReport::from_records(&records);

    assert_eq!(records[0].outcome, Outcome::Passed);
    assert_eq!(records[1].outcome.status(), "failed");
    assert_eq!(report.passed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.flaky_failures, 1);
    assert!(!report.is_success());
}

#[tokio::test]
async fn generation_dataset_is_scored() {
    let file = write_dataset(
        ".yml",
        "inputs:\n  messages:\n    - role: user\n      content: Write a haiku about Rust\n",
    );
    let dataset = Dataset::load(file.path()).unwrap();

    let engine = StubNodeEngine::new().with_node(
        "generateArtifact",
        StubNodeResponse::success(json!({
            "artifact": {"currentIndex": 1, "contents": [
                {"index": 1, "type": "text", "title": "Haiku", "fullMarkdown": "Borrowed, not owned"}
            ]}
        })),
    );
    let provider = Arc::new(StubLLMProvider::new(vec![StubReply::structured(json!({
        "justification": "A haiku, though short one line.",
        "quality_score": 6
    }))]));
    let runner = EvalCaseRunner::new(Arc::new(engine), &EvalConfig::default())
        .with_judge(QualityJudge::new(provider.clone()));

    let records = runner
        .run_all(&dataset.cases, EvalMode::Generation)
        .await
        .unwrap();
    let report = EvalReport::from_records(&records);

    assert_eq!(report.scored, 1);
    assert_eq!(report.mean_score, Some(6.0));
    assert!(report.is_success());
    assert_eq!(records[0].node, "generateArtifact");
    assert!(provider.requests()[0]
        .prompt_text()
        .contains("<generated_code>\nBorrowed, not owned\n</generated_code>"));

    let serialized = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(serialized["outcome"]["status"], "scored");
    assert_eq!(serialized["outcome"]["verdict"]["key"], "quality");
}

#[tokio::test]
async fn custom_run_config_is_forwarded() {
    let engine = StubNodeEngine::new().with_node(
        "generatePath",
        StubNodeResponse::success(json!({"next": "x"})),
    );
    let runner = EvalCaseRunner::new(Arc::new(engine.clone()), &EvalConfig::default())
        .with_run_config(RunConfig::new("claude-3-5-haiku").with_option("temperature", json!(0)));

    let case = EvalCase::new(json!({})).with_reference(json!({"next": "x"}));
    runner.run(&case, EvalMode::Routing).await;

    let history = engine.history().await;
    assert_eq!(history[0].config.model_name, "claude-3-5-haiku");
    assert_eq!(history[0].config.options["temperature"], json!(0));
}
