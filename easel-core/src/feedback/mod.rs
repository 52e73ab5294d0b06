//! Feedback client
//!
//! Submits and fetches user feedback against the feedback API. Calls never
//! raise: failures surface as `None`, with transport and decode failures
//! kept as the client's last error.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::FeedbackConfig;
use crate::error::{EaselError, Result};

/// A stored feedback entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub key: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Response to a feedback submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub success: bool,
    #[serde(default)]
    pub feedback: serde_json::Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackSubmission<'a> {
    feedback_key: &'a str,
    score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}

/// Clears the loading flag when a call ends
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// HTTP client for the feedback API
pub struct FeedbackClient {
    client: reqwest::Client,
    base_url: String,
    is_loading: AtomicBool,
    error: Mutex<Option<String>>,
}

impl FeedbackClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            is_loading: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    pub fn from_config(config: &FeedbackConfig) -> Self {
        Self::new(config.base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a call is in flight
    pub fn is_loading(&self) -> bool {
        self.is_loading.load(Ordering::SeqCst)
    }

    /// Message of the last transport or decode failure
    pub fn error(&self) -> Option<String> {
        self.error.lock().ok().and_then(|e| e.clone())
    }

    fn set_error(&self, message: Option<String>) {
        if let Ok(mut error) = self.error.lock() {
            *error = message;
        }
    }

    /// Submit a score for `key`.
    ///
    /// Returns `None` on any non-success status or failure.
    pub async fn send_feedback(
        &self,
        key: &str,
        score: f64,
        comment: Option<&str>,
    ) -> Option<FeedbackResponse> {
        let _loading = LoadingGuard::start(&self.is_loading);
        self.set_error(None);

        let body = FeedbackSubmission {
            feedback_key: key,
            score,
            comment,
        };
        let request = self
            .client
            .post(format!("{}/feedback", self.base_url))
            .json(&body);

        self.complete(request, "Error sending feedback").await
    }

    /// Fetch every feedback entry stored under `key`
    pub async fn get_feedback(&self, key: &str) -> Option<Vec<Feedback>> {
        let _loading = LoadingGuard::start(&self.is_loading);
        self.set_error(None);

        let url = format!(
            "{}/feedback?feedbackKey={}",
            self.base_url,
            urlencoding::encode(key)
        );
        self.complete(self.client.get(url), "Error fetching feedback")
            .await
    }

    async fn complete<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Option<T> {
        match Self::fetch(request).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "{}", context);
                self.set_error(Some(e.to_string()));
                None
            }
        }
    }

    /// `Ok(None)` for a non-success status, `Err` for transport or decode failures
    async fn fetch<T: serde::de::DeserializeOwned>(
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>> {
        let response = request
            .send()
            .await
            .map_err(|e| EaselError::Other(format!("Feedback request failed: {}", e)))?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "feedback API returned an error status");
            return Ok(None);
        }

        let value = response
            .json()
            .await
            .map_err(|e| EaselError::Other(format!("Invalid feedback response: {}", e)))?;
        Ok(Some(value))
    }
}
