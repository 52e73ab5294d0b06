//! HTTP client for a remote workflow engine
//!
//! `POST {base_url}/nodes/{node_id}/invoke` with `{input, config: {configurable}}`.
//! The response body is the node result.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;

use super::engine::{EngineError, InvocationConfig, NodeEngine, NodeResult, Payload, RunConfig};

#[derive(Serialize)]
struct InvokeBody<'a> {
    input: &'a Payload,
    config: InvocationConfig<'a>,
}

/// [`NodeEngine`] backed by a workflow engine reachable over HTTP
pub struct HttpNodeEngine {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNodeEngine {
    /// Create a client with the given per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn node_url(&self, node_id: &str) -> String {
        format!(
            "{}/nodes/{}/invoke",
            self.base_url,
            urlencoding::encode(node_id)
        )
    }
}

#[async_trait]
impl NodeEngine for HttpNodeEngine {
    async fn invoke(
        &self,
        node_id: &str,
        inputs: &Payload,
        config: &RunConfig,
    ) -> Result<NodeResult, EngineError> {
        let body = InvokeBody {
            input: inputs,
            config: InvocationConfig::new(config),
        };

        let response = self
            .client
            .post(self.node_url(node_id))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::Timeout(format!("Node '{}' timed out: {}", node_id, e))
                } else {
                    EngineError::Model(format!("Failed to reach workflow engine: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::NOT_FOUND => EngineError::NodeNotFound(node_id.to_string()),
                StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                    EngineError::Timeout(format!("Node '{}' timed out ({}): {}", node_id, status, text))
                }
                _ => EngineError::Model(format!("Node '{}' failed ({}): {}", node_id, status, text)),
            });
        }

        response.json().await.map_err(|e| {
            EngineError::Other(format!("Node '{}' returned invalid JSON: {}", node_id, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_url_is_escaped() {
        let engine = HttpNodeEngine::new("http://localhost:2024/", Duration::from_secs(1)).unwrap();
        assert_eq!(engine.base_url(), "http://localhost:2024");
        assert_eq!(
            engine.node_url("generatePath"),
            "http://localhost:2024/nodes/generatePath/invoke"
        );
        assert_eq!(
            engine.node_url("a/b"),
            "http://localhost:2024/nodes/a%2Fb/invoke"
        );
    }
}
