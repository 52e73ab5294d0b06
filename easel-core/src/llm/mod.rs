use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{EaselError, Result};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Request to an LLM provider
#[derive(Debug, Clone)]
pub struct LLMRequest {
    /// Messages in the conversation
    pub messages: Vec<Message>,

    /// Temperature for generation (0.0-2.0)
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    pub max_tokens: Option<usize>,
}

impl LLMRequest {
    /// Create a simple request from a single prompt
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(prompt)],
            temperature: None,
            max_tokens: None,
        }
    }

    /// Builder: set the temperature
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature.map(|t| t.clamp(0.0, 2.0));
        self
    }

    /// Concatenated text of every message
    pub fn prompt_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct LLMResponse {
    /// Generated content
    pub content: String,
}

/// Schema descriptor for a structured (schema-constrained) invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredOutput {
    /// Name the provider reports the structure under
    pub name: String,

    /// Optional human description of the structure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON schema the output must conform to
    pub schema: serde_json::Value,
}

impl StructuredOutput {
    pub fn new(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            schema,
        }
    }
}

/// Trait for LLM provider implementations.
///
/// Implementors handle the actual model calls. Provider and network failures
/// are reported as [`EaselError::Model`].
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate text from a structured request.
    async fn generate_request(&self, request: &LLMRequest) -> Result<LLMResponse>;

    /// Generate structured output (JSON) as a JSON value.
    ///
    /// Providers with native schema support should override this to constrain
    /// the model. The default asks for plain text and parses it; content that
    /// is not JSON is a schema validation failure.
    async fn generate_structured(
        &self,
        request: &LLMRequest,
        _output: &StructuredOutput,
    ) -> Result<serde_json::Value> {
        let response = self.generate_request(request).await?;
        serde_json::from_str(&response.content).map_err(|e| {
            EaselError::SchemaValidation(format!("Failed to parse structured output: {}", e))
        })
    }

    /// Get model information
    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "unknown".to_string(),
            model_name: "unknown".to_string(),
        }
    }
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub provider: String,
    pub model_name: String,
}

pub mod factory;
pub mod providers;
pub mod stub;

pub use factory::LLMProviderFactory;
pub use stub::{StubLLMProvider, StubReply};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_temperature_clamping() {
        let request = LLMRequest::from_prompt("hi").with_temperature(Some(5.0));
        assert_eq!(request.temperature, Some(2.0));

        let request = LLMRequest::from_prompt("hi").with_temperature(Some(-1.0));
        assert_eq!(request.temperature, Some(0.0));
    }

    #[tokio::test]
    async fn test_default_structured_parses_json() {
        let provider = StubLLMProvider::new(vec![StubReply::text(r#"{"a": 1}"#)]);
        let output = StructuredOutput::new("t", json!({"type": "object"}));

        let value = provider
            .generate_structured(&LLMRequest::from_prompt("x"), &output)
            .await
            .unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_default_structured_rejects_prose() {
        let provider = StubLLMProvider::new(vec![StubReply::text("The code looks fine, 8/10.")]);
        let output = StructuredOutput::new("t", json!({"type": "object"}));

        let err = provider
            .generate_structured(&LLMRequest::from_prompt("x"), &output)
            .await
            .unwrap_err();
        assert!(matches!(err, EaselError::SchemaValidation(_)));
    }
}
