//! Node stubbing for deterministic evaluation
//!
//! A stand-in for the workflow engine that returns canned node results,
//! enabling offline runs of the evaluation pipeline.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::engine::{EngineError, NodeEngine, NodeResult, Payload, RunConfig};

/// Predetermined response for a stubbed node
#[derive(Debug, Clone)]
pub struct StubNodeResponse {
    /// Result or failure to return
    pub result: Result<NodeResult, EngineError>,

    /// Simulated latency in milliseconds
    pub delay_ms: u64,
}

impl StubNodeResponse {
    /// Create a successful response
    pub fn success(value: Value) -> Self {
        Self {
            result: Ok(value),
            delay_ms: 0,
        }
    }

    /// Create a failing response
    pub fn error(error: EngineError) -> Self {
        Self {
            result: Err(error),
            delay_ms: 0,
        }
    }

    /// Add a simulated delay
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// A recorded node invocation
#[derive(Debug, Clone)]
pub struct RecordedInvocation {
    pub node_id: String,
    pub inputs: Payload,
    pub config: RunConfig,
}

struct StubNode {
    responses: Vec<StubNodeResponse>,
    call_count: AtomicUsize,
}

/// Workflow engine double keyed by node identifier
#[derive(Clone, Default)]
pub struct StubNodeEngine {
    nodes: HashMap<String, Arc<StubNode>>,
    history: Arc<RwLock<Vec<RecordedInvocation>>>,
}

impl StubNodeEngine {
    /// Create an engine with no nodes
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node with a single response
    pub fn with_node(self, node_id: impl Into<String>, response: StubNodeResponse) -> Self {
        self.with_node_responses(node_id, vec![response])
    }

    /// Register a node with multiple responses (returned in order, last repeats)
    pub fn with_node_responses(
        mut self,
        node_id: impl Into<String>,
        responses: Vec<StubNodeResponse>,
    ) -> Self {
        self.nodes.insert(
            node_id.into(),
            Arc::new(StubNode {
                responses,
                call_count: AtomicUsize::new(0),
            }),
        );
        self
    }

    /// Number of times a node has been invoked
    pub fn call_count(&self, node_id: &str) -> usize {
        self.nodes
            .get(node_id)
            .map(|n| n.call_count.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Every invocation made so far, in order
    pub async fn history(&self) -> Vec<RecordedInvocation> {
        self.history.read().await.clone()
    }

    /// Reset call counts and history
    pub async fn reset(&self) {
        for node in self.nodes.values() {
            node.call_count.store(0, Ordering::SeqCst);
        }
        self.history.write().await.clear();
    }
}

#[async_trait]
impl NodeEngine for StubNodeEngine {
    async fn invoke(
        &self,
        node_id: &str,
        inputs: &Payload,
        config: &RunConfig,
    ) -> Result<NodeResult, EngineError> {
        self.history.write().await.push(RecordedInvocation {
            node_id: node_id.to_string(),
            inputs: inputs.clone(),
            config: config.clone(),
        });

        let node = self
            .nodes
            .get(node_id)
            .ok_or_else(|| EngineError::NodeNotFound(node_id.to_string()))?;

        let call_num = node.call_count.fetch_add(1, Ordering::SeqCst);
        let response = match node.responses.get(call_num).or_else(|| node.responses.last()) {
            Some(response) => response.clone(),
            None => StubNodeResponse::success(Value::Null),
        };

        if response.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(response.delay_ms)).await;
        }

        response.result
    }
}
