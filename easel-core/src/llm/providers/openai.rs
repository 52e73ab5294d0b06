//! OpenAI chat-completions provider
//!
//! Structured calls use `json_schema` response formats in strict mode, so
//! the judge reply is constrained by the provider before local validation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{EaselError, Result};
use crate::llm::{
    LLMProvider, LLMRequest, LLMResponse, Message, MessageRole, ModelInfo, StructuredOutput,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI LLM provider (GPT-4o and compatible chat-completions APIs).
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIProvider {
    /// Provider against the public OpenAI endpoint
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Provider against any chat-completions compatible endpoint
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, body: &OpenAIRequest<'_>) -> Result<LLMResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| EaselError::Model(format!("Failed to send request to OpenAI: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if let Ok(error) = serde_json::from_str::<OpenAIError>(&text) {
                return Err(EaselError::Model(format!(
                    "OpenAI API error ({}): {}",
                    error.error.error_type.unwrap_or_else(|| status.to_string()),
                    error.error.message
                )));
            }

            return Err(EaselError::Model(format!(
                "OpenAI API error ({}): {}",
                status, text
            )));
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| EaselError::Model(format!("Failed to parse OpenAI response: {}", e)))?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| EaselError::Model("OpenAI API returned no choices".to_string()))?;

        if let Some(refusal) = choice.message.refusal {
            return Err(EaselError::SchemaValidation(format!(
                "Model refused to produce structured output: {}",
                refusal
            )));
        }

        if let Some(usage) = openai_response.usage {
            tracing::debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "openai token usage"
            );
        }

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
        })
    }

    fn build_request<'a>(
        &'a self,
        request: &LLMRequest,
        response_format: Option<ResponseFormat<'a>>,
    ) -> OpenAIRequest<'a> {
        OpenAIRequest {
            model: &self.model,
            messages: convert_messages(&request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format,
        }
    }
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    schema: &'a serde_json::Value,
    strict: bool,
}

#[derive(Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessageResponse,
}

#[derive(Deserialize)]
struct OpenAIMessageResponse {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[derive(Deserialize)]
struct OpenAIError {
    error: OpenAIErrorDetail,
}

#[derive(Deserialize)]
struct OpenAIErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

fn convert_messages(messages: &[Message]) -> Vec<OpenAIMessage> {
    messages
        .iter()
        .map(|m| OpenAIMessage {
            role: match m.role {
                MessageRole::System => "system".to_string(),
                MessageRole::User => "user".to_string(),
                MessageRole::Assistant => "assistant".to_string(),
            },
            content: m.content.clone(),
        })
        .collect()
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn generate_request(&self, request: &LLMRequest) -> Result<LLMResponse> {
        let body = self.build_request(request, None);
        self.send(&body).await
    }

    async fn generate_structured(
        &self,
        request: &LLMRequest,
        output: &StructuredOutput,
    ) -> Result<serde_json::Value> {
        let format = ResponseFormat {
            format_type: "json_schema",
            json_schema: JsonSchemaFormat {
                name: &output.name,
                description: output.description.as_deref(),
                schema: &output.schema,
                strict: true,
            },
        };
        let body = self.build_request(request, Some(format));
        let response = self.send(&body).await?;

        serde_json::from_str(&response.content).map_err(|e| {
            EaselError::SchemaValidation(format!("Failed to parse structured output: {}", e))
        })
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "openai".to_string(),
            model_name: self.model.clone(),
        }
    }
}
