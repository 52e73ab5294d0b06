//! Run sharing endpoint
//!
//! Handles `POST /runs/share`. The handler is transport agnostic: it maps
//! a raw request body to a status code and JSON body, so any HTTP server
//! can mount it. Sharing is retried with a fixed delay before the caller
//! sees a generic failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::config::ShareConfig;
use crate::error::Result;
use crate::retry::{RetryConfig, with_retry};

/// Message returned when the request carries no run id
pub const MISSING_RUN_ID: &str = "`runId` is required to share run.";

/// Message returned when the body is not a JSON object
pub const INVALID_BODY: &str = "Invalid request body.";

/// Message returned once every share attempt has failed
pub const SHARE_EXHAUSTED: &str = "Failed to share run after multiple attempts.";

/// Backend able to publish a run and return its public URL
#[async_trait]
pub trait RunSharer: Send + Sync {
    async fn share(&self, run_id: &str) -> Result<String>;
}

/// Sharer that derives the public link from a base URL
#[derive(Debug, Clone)]
pub struct LinkRunSharer {
    base_url: String,
}

impl LinkRunSharer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RunSharer for LinkRunSharer {
    async fn share(&self, run_id: &str) -> Result<String> {
        Ok(format!("{}/{}", self.base_url, run_id))
    }
}

/// Request body for `POST /runs/share`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShareRequest {
    #[serde(rename = "runId", default)]
    pub run_id: Option<String>,
}

/// Status and JSON body produced by the handler
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareResponse {
    pub status: u16,
    pub body: Value,
}

impl ShareResponse {
    fn ok(url: String) -> Self {
        Self {
            status: 200,
            body: json!({ "sharedRunURL": url }),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Share handler with bounded fixed-delay retries
#[derive(Clone)]
pub struct ShareService {
    sharer: Arc<dyn RunSharer>,
    retry: RetryConfig,
}

impl ShareService {
    pub fn new(sharer: Arc<dyn RunSharer>, retry: RetryConfig) -> Self {
        Self { sharer, retry }
    }

    /// Build a service sharing links under the configured base URL
    pub fn from_config(config: &ShareConfig) -> Self {
        Self::new(
            Arc::new(LinkRunSharer::new(config.base_url.clone())),
            config.retry.clone(),
        )
    }

    /// Handle a raw request body
    pub async fn handle(&self, body: &[u8]) -> ShareResponse {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "share request is not JSON");
                return ShareResponse::error(400, INVALID_BODY);
            }
        };
        if !value.is_object() {
            return ShareResponse::error(400, INVALID_BODY);
        }

        let request: ShareRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "share request has an unexpected shape");
                return ShareResponse::error(400, INVALID_BODY);
            }
        };

        self.share_request(&request).await
    }

    /// Handle an already decoded request
    pub async fn share_request(&self, request: &ShareRequest) -> ShareResponse {
        match request.run_id.as_deref() {
            Some(run_id) if !run_id.is_empty() => self.share_run(run_id).await,
            _ => ShareResponse::error(400, MISSING_RUN_ID),
        }
    }

    /// Share a run, retrying failures until the budget is spent
    pub async fn share_run(&self, run_id: &str) -> ShareResponse {
        let sharer = &self.sharer;
        match with_retry(&self.retry, || sharer.share(run_id)).await {
            Ok(url) => {
                tracing::info!(run_id, url = %url, "run shared");
                ShareResponse::ok(url)
            }
            Err(e) => {
                tracing::error!(run_id, error = %e, "Failed to share run after multiple attempts");
                ShareResponse::error(500, SHARE_EXHAUSTED)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EaselError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Fails the first `failures` calls, then delegates to a link sharer
    struct FlakySharer {
        failures: usize,
        calls: AtomicUsize,
        inner: LinkRunSharer,
    }

    impl FlakySharer {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                failures,
                calls: AtomicUsize::new(0),
                inner: LinkRunSharer::new("https://example.com/shared-run"),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RunSharer for FlakySharer {
        async fn share(&self, run_id: &str) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(EaselError::Other(format!("backend unavailable ({})", call)));
            }
            self.inner.share(run_id).await
        }
    }

    fn service(sharer: Arc<FlakySharer>) -> ShareService {
        ShareService::new(sharer, RetryConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_on_fifth_attempt() {
        let sharer = FlakySharer::new(4);
        let start = tokio::time::Instant::now();

        let response = service(sharer.clone()).handle(br#"{"runId": "abc"}"#).await;

        assert_eq!(response.status, 200);
        assert_eq!(
            response.body,
            json!({"sharedRunURL": "https://example.com/shared-run/abc"})
        );
        assert_eq!(sharer.calls(), 5);
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_run_id_is_rejected_without_attempts() {
        let sharer = FlakySharer::new(0);
        let service = service(sharer.clone());

        for body in [&br#"{}"#[..], br#"{"runId": null}"#, br#"{"runId": ""}"#] {
            let response = service.handle(body).await;
            assert_eq!(response.status, 400);
            assert_eq!(response.body, json!({"error": MISSING_RUN_ID}));
        }
        assert_eq!(sharer.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_generic_error_after_five_attempts() {
        let sharer = FlakySharer::new(usize::MAX);

        let response = service(sharer.clone()).handle(br#"{"runId": "abc"}"#).await;

        assert_eq!(response.status, 500);
        assert_eq!(response.body, json!({"error": SHARE_EXHAUSTED}));
        assert!(!response.body.to_string().contains("backend unavailable"));
        assert_eq!(sharer.calls(), 5);
    }

    #[tokio::test]
    async fn malformed_bodies_are_bad_requests() {
        let sharer = FlakySharer::new(0);
        let service = service(sharer.clone());

        for body in [&b"not json"[..], b"[]", b"\"abc\"", br#"{"runId": 7}"#] {
            let response = service.handle(body).await;
            assert_eq!(response.status, 400, "{:?}", String::from_utf8_lossy(body));
            assert_eq!(response.body, json!({"error": INVALID_BODY}));
        }
        assert_eq!(sharer.calls(), 0);
    }

    #[tokio::test]
    async fn link_sharer_uses_base_url() {
        let service = ShareService::from_config(&ShareConfig::default());
        let response = service.share_run("run-42").await;
        assert!(response.is_success());
        assert_eq!(
            response.body["sharedRunURL"],
            "https://example.com/shared-run/run-42"
        );
    }
}
