//! Configuration types for Easel

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{EaselError, Result};
use crate::retry::RetryConfig;

/// Main configuration for Easel
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EaselConfig {
    /// Judge model configuration
    #[serde(default)]
    pub judge: JudgeConfig,

    /// Evaluation run configuration
    #[serde(default)]
    pub eval: EvalConfig,

    /// Share endpoint configuration
    #[serde(default)]
    pub share: ShareConfig,

    /// Feedback endpoint configuration
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    #[default]
    OpenAI,
}

/// Judge model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    /// Provider type
    #[serde(default)]
    pub provider: LLMProvider,

    /// Model name
    #[serde(default = "default_judge_model")]
    pub model: String,

    /// API key (if needed, prefer env vars)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL (for OpenAI-compatible endpoints)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Sampling temperature for judge calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

fn default_judge_model() -> String {
    "gpt-4o".to_string()
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::OpenAI,
            model: default_judge_model(),
            api_key: None,
            base_url: None,
            temperature: None,
        }
    }
}

/// Evaluation run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Base URL of the remote workflow engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_url: Option<String>,

    /// Node that decides which downstream node handles an input
    #[serde(default = "default_routing_node")]
    pub routing_node: String,

    /// Node that produces artifacts
    #[serde(default = "default_generation_node")]
    pub generation_node: String,

    /// Model name forwarded to the workflow in the run configuration
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// JSON pointer to the user query inside the case inputs
    #[serde(default = "default_query_pointer")]
    pub query_pointer: String,

    /// JSON pointer to the artifact content list inside a node result
    #[serde(default = "default_artifact_pointer")]
    pub artifact_pointer: String,

    /// Maximum number of cases evaluated at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-request timeout for the HTTP engine client
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

fn default_routing_node() -> String {
    "generatePath".to_string()
}

fn default_generation_node() -> String {
    "generateArtifact".to_string()
}

fn default_model_name() -> String {
    "gpt-4o-mini".to_string()
}

fn default_query_pointer() -> String {
    "/messages/0/content".to_string()
}

fn default_artifact_pointer() -> String {
    "/artifact/contents".to_string()
}

fn default_max_concurrency() -> usize {
    4
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(120)
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            engine_url: None,
            routing_node: default_routing_node(),
            generation_node: default_generation_node(),
            model_name: default_model_name(),
            query_pointer: default_query_pointer(),
            artifact_pointer: default_artifact_pointer(),
            max_concurrency: default_max_concurrency(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Share endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Prefix of shared run links
    #[serde(default = "default_share_base_url")]
    pub base_url: String,

    /// Retry budget for share attempts
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_share_base_url() -> String {
    "https://example.com/shared-run".to_string()
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            base_url: default_share_base_url(),
            retry: RetryConfig::default(),
        }
    }
}

/// Feedback endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Base URL the `/feedback` route hangs off
    #[serde(default = "default_feedback_base_url")]
    pub base_url: String,
}

fn default_feedback_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            base_url: default_feedback_base_url(),
        }
    }
}

impl EaselConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. Configuration file (easel.toml, then the path in EASEL_CONFIG_PATH)
    /// 3. Environment variable overrides (`EASEL_EVAL__ROUTING_NODE=...`)
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is invalid or validation fails.
    pub fn load() -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(EaselConfig::default()))
            .merge(Toml::file("easel.toml"));

        if let Ok(path) = std::env::var("EASEL_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        let config: EaselConfig = figment
            .merge(Env::prefixed("EASEL_").split("__"))
            .extract()
            .map_err(|e| EaselError::Configuration(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Serialized, Toml},
        };

        let path = path.as_ref();
        if !path.exists() {
            return Err(EaselError::Configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let config: EaselConfig = Figment::from(Serialized::defaults(EaselConfig::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| {
                EaselError::Configuration(format!("Failed to load configuration file: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.eval.routing_node.trim().is_empty() || self.eval.generation_node.trim().is_empty() {
            return Err(EaselError::Configuration(
                "Node identifiers must not be empty".to_string(),
            ));
        }
        for (name, pointer) in [
            ("query_pointer", &self.eval.query_pointer),
            ("artifact_pointer", &self.eval.artifact_pointer),
        ] {
            if !pointer.is_empty() && !pointer.starts_with('/') {
                return Err(EaselError::Configuration(format!(
                    "{} must be a JSON pointer starting with '/': {}",
                    name, pointer
                )));
            }
        }
        if self.eval.max_concurrency == 0 {
            return Err(EaselError::Configuration(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.share.retry.max_attempts == 0 {
            return Err(EaselError::Configuration(
                "share.retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
