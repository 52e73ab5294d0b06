//! Evaluation case runner
//!
//! Drives one case through the designated node and turns the node result
//! into an [`Outcome`]. Routing mode asserts against the reference output;
//! generation mode extracts the first artifact and asks the judge for a
//! quality verdict. Nothing is shared between cases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::dataset::EvalCase;
use super::engine::{NodeEngine, NodeInvoker, NodeResult, Payload, RunConfig};
use super::judge::{QualityJudge, QualityVerdict};
use super::routing::{PathMismatch, assert_routed};
use crate::config::EvalConfig;
use crate::error::{EaselError, ErrorKind, Result};

/// Which path a case runs through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalMode {
    Routing,
    Generation,
}

impl std::fmt::Display for EvalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalMode::Routing => write!(f, "routing"),
            EvalMode::Generation => write!(f, "generation"),
        }
    }
}

impl std::str::FromStr for EvalMode {
    type Err = EaselError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "routing" => Ok(EvalMode::Routing),
            "generation" => Ok(EvalMode::Generation),
            other => Err(EaselError::Configuration(format!(
                "Unknown eval mode '{}', expected routing or generation",
                other
            ))),
        }
    }
}

/// Disposition of a single case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Routing result matched the reference
    Passed,

    /// Routing result diverged from the reference
    Failed { mismatches: Vec<PathMismatch> },

    /// Generation was scored; the verdict is informational
    Scored { verdict: QualityVerdict },

    /// The case could not be evaluated
    Errored { kind: ErrorKind, message: String },
}

impl Outcome {
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Failed { .. } => "failed",
            Outcome::Scored { .. } => "scored",
            Outcome::Errored { .. } => "errored",
        }
    }

    fn from_error(error: &EaselError) -> Self {
        Outcome::Errored {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Observability record for one evaluated case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRecord {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub mode: EvalMode,
    pub node: String,
    #[serde(default)]
    pub flaky: bool,
    pub inputs: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<NodeResult>,
    pub outcome: Outcome,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Runs evaluation cases against a node engine
#[derive(Clone)]
pub struct EvalCaseRunner {
    invoker: NodeInvoker,
    judge: Option<QualityJudge>,
    run_config: RunConfig,
    routing_node: String,
    generation_node: String,
    query_pointer: String,
    artifact_pointer: String,
    max_concurrency: usize,
}

impl EvalCaseRunner {
    /// Create a runner using the node ids and pointers from `config`
    pub fn new(engine: Arc<dyn NodeEngine>, config: &EvalConfig) -> Self {
        Self {
            invoker: NodeInvoker::new(engine),
            judge: None,
            run_config: RunConfig::new(config.model_name.clone()),
            routing_node: config.routing_node.clone(),
            generation_node: config.generation_node.clone(),
            query_pointer: config.query_pointer.clone(),
            artifact_pointer: config.artifact_pointer.clone(),
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    /// Builder: set the judge used in generation mode
    pub fn with_judge(mut self, judge: QualityJudge) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Builder: replace the run configuration forwarded to every node
    pub fn with_run_config(mut self, run_config: RunConfig) -> Self {
        self.run_config = run_config;
        self
    }

    /// Builder: override the node used for a mode
    pub fn with_node(mut self, mode: EvalMode, node_id: impl Into<String>) -> Self {
        match mode {
            EvalMode::Routing => self.routing_node = node_id.into(),
            EvalMode::Generation => self.generation_node = node_id.into(),
        }
        self
    }

    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    /// Node a mode is dispatched to
    pub fn node_for(&self, mode: EvalMode) -> &str {
        match mode {
            EvalMode::Routing => &self.routing_node,
            EvalMode::Generation => &self.generation_node,
        }
    }

    /// Evaluate one case, propagating failures.
    ///
    /// Routing mismatches are an [`Outcome::Failed`], not an error.
    pub async fn run_case(&self, case: &EvalCase, mode: EvalMode) -> Result<Outcome> {
        match self.evaluate(case, mode).await {
            Ok((_, outcome)) => Ok(outcome),
            Err((_, e)) => Err(e),
        }
    }

    /// Errors carry the node output when the failure came after the node returned.
    async fn evaluate(
        &self,
        case: &EvalCase,
        mode: EvalMode,
    ) -> std::result::Result<(NodeResult, Outcome), CaseFailure> {
        match mode {
            EvalMode::Routing => {
                let expected = case.reference_outputs.as_ref().ok_or_else(|| {
                    before_node(EaselError::Dataset(
                        "routing case has no referenceOutputs".to_string(),
                    ))
                })?;

                let output = self
                    .invoker
                    .invoke(&self.routing_node, &case.inputs, &self.run_config)
                    .await
                    .map_err(|e| before_node(e.into()))?;

                let routed = assert_routed(&output, expected);
                let outcome = if routed.passed() {
                    Outcome::Passed
                } else {
                    tracing::warn!(
                        node = %self.routing_node,
                        flaky = case.flaky,
                        diff = %routed.diff(),
                        "routing mismatch"
                    );
                    Outcome::Failed {
                        mismatches: routed.mismatches,
                    }
                };
                Ok((output, outcome))
            }
            EvalMode::Generation => {
                let judge = self.judge.as_ref().ok_or_else(|| {
                    before_node(EaselError::Configuration(
                        "generation mode requires a judge".to_string(),
                    ))
                })?;
                let query =
                    extract_query(&case.inputs, &self.query_pointer).map_err(before_node)?;

                let output = self
                    .invoker
                    .invoke(&self.generation_node, &case.inputs, &self.run_config)
                    .await
                    .map_err(|e| before_node(e.into()))?;

                let scored = match extract_artifact_content(&output, &self.artifact_pointer) {
                    Ok(content) => judge.judge(&query, &content).await,
                    Err(e) => Err(e),
                };
                match scored {
                    Ok(verdict) => Ok((output, Outcome::Scored { verdict })),
                    Err(e) => Err((Some(output), e)),
                }
            }
        }
    }

    /// Evaluate one case and record the result; failures become
    /// [`Outcome::Errored`].
    pub async fn run(&self, case: &EvalCase, mode: EvalMode) -> EvalRecord {
        let node = self.node_for(mode).to_string();
        let started_at = Utc::now();
        let start = Instant::now();
        let case_name = case.name.as_deref().unwrap_or("-");

        tracing::info!(case = case_name, %mode, node = %node, "case started");

        let (output, outcome) = match self.evaluate(case, mode).await {
            Ok((output, outcome)) => (Some(output), outcome),
            Err((output, e)) => {
                tracing::error!(case = case_name, %mode, node = %node, kind = ?e.kind(), error = %e, "case errored");
                (output, Outcome::from_error(&e))
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            case = case_name,
            %mode,
            node = %node,
            status = outcome.status(),
            duration_ms,
            "case finished"
        );

        EvalRecord {
            id: Uuid::new_v4(),
            name: case.name.clone(),
            mode,
            node,
            flaky: case.flaky,
            inputs: case.inputs.clone(),
            output,
            outcome,
            started_at,
            duration_ms,
        }
    }

    /// Evaluate many cases concurrently. Records come back in input order.
    ///
    /// A case whose task panics is recorded as [`ErrorKind::Other`] in its slot.
    pub async fn run_all(&self, cases: &[EvalCase], mode: EvalMode) -> Result<Vec<EvalRecord>> {
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(cases.len());
        let mut started = Vec::with_capacity(cases.len());

        for case in cases {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| EaselError::Configuration("Semaphore closed".to_string()))?;

            let runner = self.clone();
            let task_case = case.clone();
            started.push((case, Utc::now()));
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                runner.run(&task_case, mode).await
            }));
        }

        let records = futures::future::join_all(handles)
            .await
            .into_iter()
            .zip(started)
            .map(|(joined, (case, started_at))| match joined {
                Ok(record) => record,
                Err(e) => self.task_failed_record(case, mode, started_at, &e),
            })
            .collect();
        Ok(records)
    }

    fn task_failed_record(
        &self,
        case: &EvalCase,
        mode: EvalMode,
        started_at: DateTime<Utc>,
        error: &tokio::task::JoinError,
    ) -> EvalRecord {
        let node = self.node_for(mode).to_string();
        let message = format!("Case task failed: {}", error);
        tracing::error!(
            case = case.name.as_deref().unwrap_or("-"),
            %mode,
            node = %node,
            error = %message,
            "case task failed"
        );

        let duration_ms = (Utc::now() - started_at).num_milliseconds().max(0) as u64;
        EvalRecord {
            id: Uuid::new_v4(),
            name: case.name.clone(),
            mode,
            node,
            flaky: case.flaky,
            inputs: case.inputs.clone(),
            output: None,
            outcome: Outcome::Errored {
                kind: ErrorKind::Other,
                message,
            },
            started_at,
            duration_ms,
        }
    }
}

/// A case failure, with the node output when the node had already returned
type CaseFailure = (Option<NodeResult>, EaselError);

fn before_node(error: EaselError) -> CaseFailure {
    (None, error)
}

/// Read the judge query from the case inputs.
///
/// # Errors
///
/// [`EaselError::Shape`] when nothing string-valued sits at `pointer`.
pub fn extract_query(inputs: &Payload, pointer: &str) -> Result<String> {
    inputs
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| EaselError::Shape(format!("no query string at '{}' in case inputs", pointer)))
}

/// Read the generated content of the first artifact entry.
///
/// Code artifacts carry `code`, text artifacts carry `fullMarkdown`.
pub fn extract_artifact_content(output: &NodeResult, pointer: &str) -> Result<String> {
    let entries = output
        .pointer(pointer)
        .and_then(Value::as_array)
        .ok_or_else(|| EaselError::Shape(format!("no artifact list at '{}'", pointer)))?;

    let first = entries
        .first()
        .ok_or_else(|| EaselError::Shape(format!("artifact list at '{}' is empty", pointer)))?;

    first
        .get("code")
        .or_else(|| first.get("fullMarkdown"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            EaselError::Shape(format!(
                "first artifact at '{}' has no string code or fullMarkdown",
                pointer
            ))
        })
}
