//! Scripted LLM provider for offline tests
//!
//! Replies are returned in order; once they run out the last one repeats.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{EaselError, Result};
use crate::llm::{LLMProvider, LLMRequest, LLMResponse, ModelInfo, StructuredOutput};

/// Canned reply for a stub provider
#[derive(Debug, Clone)]
pub enum StubReply {
    /// Raw text content (parsed as JSON for structured calls)
    Text(String),
    /// Already-structured value returned as-is for structured calls
    Structured(serde_json::Value),
    /// Provider failure
    Error(String),
}

impl StubReply {
    pub fn text(content: impl Into<String>) -> Self {
        StubReply::Text(content.into())
    }

    pub fn structured(value: serde_json::Value) -> Self {
        StubReply::Structured(value)
    }

    pub fn error(message: impl Into<String>) -> Self {
        StubReply::Error(message.into())
    }
}

/// LLM provider that replays canned replies and records requests
pub struct StubLLMProvider {
    replies: Vec<StubReply>,
    call_count: AtomicUsize,
    requests: Mutex<Vec<LLMRequest>>,
    schemas: Mutex<Vec<StructuredOutput>>,
}

impl StubLLMProvider {
    /// Create a stub with replies returned in order
    pub fn new(replies: Vec<StubReply>) -> Self {
        Self {
            replies,
            call_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            schemas: Mutex::new(Vec::new()),
        }
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<LLMRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Schema descriptors received by structured calls
    pub fn schemas(&self) -> Vec<StructuredOutput> {
        self.schemas
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn next_reply(&self, request: &LLMRequest) -> StubReply {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match self.replies.get(call_num).or_else(|| self.replies.last()) {
            Some(reply) => reply.clone(),
            None => StubReply::Error("StubLLMProvider has no replies configured".to_string()),
        }
    }
}

#[async_trait]
impl LLMProvider for StubLLMProvider {
    async fn generate_request(&self, request: &LLMRequest) -> Result<LLMResponse> {
        match self.next_reply(request) {
            StubReply::Text(content) => Ok(LLMResponse { content }),
            StubReply::Structured(value) => Ok(LLMResponse {
                content: value.to_string(),
            }),
            StubReply::Error(message) => Err(EaselError::Model(message)),
        }
    }

    async fn generate_structured(
        &self,
        request: &LLMRequest,
        output: &StructuredOutput,
    ) -> Result<serde_json::Value> {
        if let Ok(mut schemas) = self.schemas.lock() {
            schemas.push(output.clone());
        }

        match self.next_reply(request) {
            StubReply::Structured(value) => Ok(value),
            StubReply::Text(content) => serde_json::from_str(&content).map_err(|e| {
                EaselError::SchemaValidation(format!("Failed to parse structured output: {}", e))
            }),
            StubReply::Error(message) => Err(EaselError::Model(message)),
        }
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "stub".to_string(),
            model_name: "none".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_replies_in_order_then_repeat_last() {
        let stub = StubLLMProvider::new(vec![StubReply::text("one"), StubReply::text("two")]);
        let request = LLMRequest::from_prompt("p");

        let r1 = stub.generate_request(&request).await.unwrap();
        let r2 = stub.generate_request(&request).await.unwrap();
        let r3 = stub.generate_request(&request).await.unwrap();

        assert_eq!(r1.content, "one");
        assert_eq!(r2.content, "two");
        assert_eq!(r3.content, "two");
        assert_eq!(stub.call_count(), 3);
        assert_eq!(stub.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_error_reply_is_model_error() {
        let stub = StubLLMProvider::new(vec![StubReply::error("503 upstream")]);
        let err = stub
            .generate_request(&LLMRequest::from_prompt("p"))
            .await
            .unwrap_err();
        assert!(matches!(err, EaselError::Model(m) if m == "503 upstream"));
    }

    #[tokio::test]
    async fn test_structured_reply_records_schema() {
        let stub = StubLLMProvider::new(vec![StubReply::structured(json!({"ok": true}))]);
        let output = StructuredOutput::new("judge", json!({"type": "object"}));

        let value = stub
            .generate_structured(&LLMRequest::from_prompt("p"), &output)
            .await
            .unwrap();

        assert_eq!(value, json!({"ok": true}));
        assert_eq!(stub.schemas()[0].name, "judge");
    }

    #[tokio::test]
    async fn test_empty_stub_fails() {
        let stub = StubLLMProvider::new(Vec::new());
        assert!(stub.generate_request(&LLMRequest::from_prompt("p")).await.is_err());
    }
}
