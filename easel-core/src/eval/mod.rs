//! Evaluation harness for multi-node agent workflows
//!
//! Cases are driven through a single named node of an externally owned
//! workflow:
//! - Routing cases compare the node result against a reference output
//! - Generation cases score the first generated artifact with an LLM judge
//!
//! # Architecture
//!
//! The harness depends only on the [`NodeEngine`] capability. The real
//! engine is reached over HTTP ([`HttpNodeEngine`]); tests substitute a
//! [`StubNodeEngine`] that returns canned node results.
//!
//! # Example
//!
//! ```rust,no_run
//! use easel_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> easel_core::Result<()> {
//! let config = EaselConfig::load()?;
//! let engine = StubNodeEngine::new()
//!     .with_node("generatePath", StubNodeResponse::success(serde_json::json!({"next": "rewriteArtifact"})));
//! let runner = EvalCaseRunner::new(Arc::new(engine), &config.eval);
//!
//! let dataset = Dataset::load("cases/routing.json")?;
//! let records = runner.run_all(&dataset.cases, EvalMode::Routing).await?;
//! assert!(EvalReport::from_records(&records).is_success());
//! # Ok(())
//! # }
//! ```

mod dataset;
mod engine;
mod http_engine;
mod judge;
mod report;
mod routing;
mod runner;
mod stub;

pub use dataset::{Dataset, DatasetFormat, EvalCase};
pub use engine::{
    EngineError, InvocationConfig, NodeEngine, NodeInvoker, NodeResult, Payload, RunConfig,
};
pub use http_engine::HttpNodeEngine;
pub use judge::{
    JUDGE_SCHEMA_NAME, JudgeSchema, QUALITY_KEY, QualityJudge, QualityVerdict, SCORE_SCALE,
    build_quality_prompt,
};
pub use report::EvalReport;
pub use routing::{PathMismatch, RoutingOutcome, assert_routed};
pub use runner::{
    EvalCaseRunner, EvalMode, EvalRecord, Outcome, extract_artifact_content, extract_query,
};
pub use stub::{RecordedInvocation, StubNodeEngine, StubNodeResponse};
