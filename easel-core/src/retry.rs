//! Fixed-delay retry
//!
//! A bounded retry loop expressed as an explicit state machine:
//! `Attempting(n) -> Attempting(n + 1)` on failure while `n < max`,
//! `Attempting(max) -> ExhaustedFailed` on failure at the limit, and any
//! attempt `-> Succeeded` on success. The delay between attempts is constant.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Delay between consecutive attempts
    #[serde(default = "default_delay", with = "humantime_serde")]
    pub delay: Duration,
}

fn default_max_attempts() -> usize {
    5
}

fn default_delay() -> Duration {
    Duration::from_secs(5)
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay: default_delay(),
        }
    }
}

impl RetryConfig {
    /// Create a config with no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Builder: set max attempts
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Builder: set the delay between attempts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Retry state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Attempt `n` (1-indexed) is in flight
    Attempting(usize),
    /// An attempt succeeded
    Succeeded,
    /// The last permitted attempt failed
    ExhaustedFailed,
}

impl RetryState {
    /// Initial state
    pub fn start() -> Self {
        RetryState::Attempting(1)
    }

    /// Transition after a successful attempt
    pub fn on_success(self) -> Self {
        match self {
            RetryState::Attempting(_) => RetryState::Succeeded,
            terminal => terminal,
        }
    }

    /// Transition after a failed attempt
    pub fn on_failure(self, max_attempts: usize) -> Self {
        match self {
            RetryState::Attempting(n) if n < max_attempts => RetryState::Attempting(n + 1),
            RetryState::Attempting(_) => RetryState::ExhaustedFailed,
            terminal => terminal,
        }
    }

    /// Whether no further attempts will be made
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RetryState::Attempting(_))
    }

    /// Current attempt number, if one is in flight
    pub fn attempt(&self) -> Option<usize> {
        match self {
            RetryState::Attempting(n) => Some(*n),
            _ => None,
        }
    }
}

/// Execute an async operation with fixed-delay retries.
///
/// Returns the first success, or the error of the final attempt once the
/// budget in `config` is spent.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut state = RetryState::start();

    loop {
        let attempt = state.attempt().unwrap_or(max_attempts);
        match operation().await {
            Ok(result) => {
                state = state.on_success();
                tracing::debug!(attempt, ?state, "operation succeeded");
                return Ok(result);
            }
            Err(e) => {
                state = state.on_failure(max_attempts);
                if state == RetryState::ExhaustedFailed {
                    return Err(e);
                }

                tracing::warn!(
                    attempt,
                    error = %e,
                    "Attempt {} failed. Retrying in {} seconds...",
                    attempt,
                    config.delay.as_secs_f64()
                );
                tokio::time::sleep(config.delay).await;
            }
        }
    }
}
