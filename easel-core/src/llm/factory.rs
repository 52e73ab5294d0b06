//! Factory for creating LLM providers from configuration

use crate::config::{JudgeConfig, LLMProvider as LLMProviderType};
use crate::error::Result;
use crate::llm::LLMProvider;
use std::sync::Arc;

#[cfg(feature = "llm-openai")]
use crate::llm::providers::openai::OpenAIProvider;

/// Factory for creating LLM providers
pub struct LLMProviderFactory;

impl LLMProviderFactory {
    /// Create an LLM provider from judge configuration
    ///
    /// Explicit configuration wins over the provider's environment variables,
    /// key and base URL resolved independently.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be created (e.g., missing API key)
    pub fn create(config: &JudgeConfig) -> Result<Arc<dyn LLMProvider>> {
        Self::create_with_env(config, |name| std::env::var(name).ok())
    }

    /// Same as [`create`](Self::create) with an injectable environment lookup
    pub fn create_with_env(
        config: &JudgeConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Arc<dyn LLMProvider>> {
        match config.provider {
            #[cfg(feature = "llm-openai")]
            LLMProviderType::OpenAI => {
                let api_key = config
                    .api_key
                    .clone()
                    .or_else(|| env("OPENAI_API_KEY"))
                    .ok_or_else(|| {
                        crate::error::EaselError::Configuration(
                            "No judge API key; set judge.api_key or OPENAI_API_KEY".to_string(),
                        )
                    })?;

                let model = Some(config.model.clone())
                    .filter(|m| !m.is_empty())
                    .or_else(|| env("OPENAI_MODEL"))
                    .unwrap_or_else(|| "gpt-4o".to_string());

                let provider = match config.base_url.clone().or_else(|| env("OPENAI_BASE_URL")) {
                    Some(base_url) => OpenAIProvider::with_base_url(api_key, model, base_url),
                    None => OpenAIProvider::new(api_key, model),
                };

                tracing::debug!(model = provider.model(), base_url = provider.base_url(), "judge provider ready");
                Ok(Arc::new(provider))
            }

            #[cfg(not(feature = "llm-openai"))]
            LLMProviderType::OpenAI => Err(crate::error::EaselError::Configuration(
                "OpenAI provider requires 'llm-openai' feature".to_string(),
            )),
        }
    }
}
