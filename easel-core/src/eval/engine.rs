//! Node invocation boundary
//!
//! The workflow engine is owned elsewhere. The harness only asks it to run a
//! single named node with an input payload and a run configuration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Opaque structured payload passed verbatim to a node
pub type Payload = Value;

/// Opaque structured payload returned by a node invocation
pub type NodeResult = Value;

/// Error type for node invocations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The engine has no node with this identifier
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Provider or network failure inside the node
    #[error("Model error: {0}")]
    Model(String),

    /// The invocation did not complete in time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Any other engine failure
    #[error("Engine error: {0}")]
    Other(String),
}

/// Per-invocation configuration forwarded to the workflow unchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunConfig {
    /// Model the node should use
    #[serde(rename = "customModelName", alias = "modelName")]
    pub model_name: String,

    /// Node-specific options, forwarded alongside the model name
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl RunConfig {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            options: Map::new(),
        }
    }

    /// Add a node-specific option
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// Wire wrapper: engines receive the run configuration under `configurable`
#[derive(Debug, Clone, Serialize)]
pub struct InvocationConfig<'a> {
    pub configurable: &'a RunConfig,
}

impl<'a> InvocationConfig<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self {
            configurable: config,
        }
    }
}

/// Capability interface to the external workflow engine
#[async_trait]
pub trait NodeEngine: Send + Sync {
    /// Execute a single node and return its output
    async fn invoke(
        &self,
        node_id: &str,
        inputs: &Payload,
        config: &RunConfig,
    ) -> Result<NodeResult, EngineError>;
}

/// Invokes nodes through a [`NodeEngine`], adding diagnostics only.
///
/// Failures are returned exactly as the engine raised them.
#[derive(Clone)]
pub struct NodeInvoker {
    engine: Arc<dyn NodeEngine>,
}

impl NodeInvoker {
    pub fn new(engine: Arc<dyn NodeEngine>) -> Self {
        Self { engine }
    }

    pub async fn invoke(
        &self,
        node_id: &str,
        inputs: &Payload,
        config: &RunConfig,
    ) -> Result<NodeResult, EngineError> {
        let start = Instant::now();
        tracing::debug!(node = node_id, model = %config.model_name, %inputs, "invoking node");

        let result = self.engine.invoke(node_id, inputs, config).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(output) => tracing::debug!(node = node_id, duration_ms, %output, "node returned"),
            Err(e) => tracing::debug!(node = node_id, duration_ms, error = %e, "node failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_config_wire_shape() {
        let config = RunConfig::new("gpt-4o-mini").with_option("temperature", json!(0));
        let wire = serde_json::to_value(InvocationConfig::new(&config)).unwrap();

        assert_eq!(
            wire,
            json!({"configurable": {"customModelName": "gpt-4o-mini", "temperature": 0}})
        );
    }

    #[test]
    fn run_config_accepts_model_name_alias() {
        let config: RunConfig =
            serde_json::from_value(json!({"modelName": "gpt-4o", "maxTokens": 100})).unwrap();
        assert_eq!(config.model_name, "gpt-4o");
        assert_eq!(config.options.get("maxTokens"), Some(&json!(100)));
    }

    struct FailingEngine;

    #[async_trait]
    impl NodeEngine for FailingEngine {
        async fn invoke(
            &self,
            node_id: &str,
            _inputs: &Payload,
            _config: &RunConfig,
        ) -> Result<NodeResult, EngineError> {
            Err(EngineError::NodeNotFound(node_id.to_string()))
        }
    }

    #[tokio::test]
    async fn invoker_propagates_engine_error_unchanged() {
        let invoker = NodeInvoker::new(Arc::new(FailingEngine));
        let err = invoker
            .invoke("missingNode", &json!({}), &RunConfig::new("m"))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::NodeNotFound("missingNode".to_string()));
    }
}
