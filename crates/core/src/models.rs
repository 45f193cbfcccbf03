//! # PaperLab Models
//!
//! Centralized LLM configuration types for the PaperLab pipeline.
//! Every agent talks to the same endpoint, so one `ModelConfig` is
//! resolved per run and turned into a single shared [`Gateway`].
//!
//! ## Providers
//! - Anthropic (Claude) - `ANTHROPIC_API_KEY`, Messages API
//! - OpenAI (GPT) - `OPENAI_API_KEY`, chat completions
//! - OpenRouter - `OPENROUTER_API_KEY`, OpenAI-compatible
//! - Grok (xAI) - `XAI_API_KEY`, OpenAI-compatible
//! - DeepSeek - `DEEPSEEK_API_KEY`, OpenAI-compatible

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::gateway::{AnthropicGateway, Gateway, OpenAiCompatGateway};

/// Default per-request timeout for gateway calls
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Supported LLM providers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAI,
    OpenRouter,
    Grok,
    DeepSeek,
}

impl LlmProvider {
    /// Get all available providers
    pub fn all() -> Vec<LlmProvider> {
        vec![
            LlmProvider::Anthropic,
            LlmProvider::OpenAI,
            LlmProvider::OpenRouter,
            LlmProvider::Grok,
            LlmProvider::DeepSeek,
        ]
    }

    /// Parse the lowercase identifier used in config files and API requests
    pub fn from_id(id: &str) -> Option<LlmProvider> {
        match id.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Some(LlmProvider::Anthropic),
            "openai" => Some(LlmProvider::OpenAI),
            "openrouter" => Some(LlmProvider::OpenRouter),
            "grok" | "xai" => Some(LlmProvider::Grok),
            "deepseek" => Some(LlmProvider::DeepSeek),
            _ => None,
        }
    }

    /// Lowercase identifier (inverse of [`LlmProvider::from_id`])
    pub fn id(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::OpenAI => "openai",
            LlmProvider::OpenRouter => "openrouter",
            LlmProvider::Grok => "grok",
            LlmProvider::DeepSeek => "deepseek",
        }
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "Anthropic",
            LlmProvider::OpenAI => "OpenAI",
            LlmProvider::OpenRouter => "OpenRouter",
            LlmProvider::Grok => "Grok",
            LlmProvider::DeepSeek => "DeepSeek",
        }
    }

    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::OpenRouter => "OPENROUTER_API_KEY",
            LlmProvider::Grok => "XAI_API_KEY",
            LlmProvider::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    /// Model used when the config does not name one
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "claude-sonnet-4-20250514",
            LlmProvider::OpenAI => "gpt-4o",
            LlmProvider::OpenRouter => "anthropic/claude-3.5-sonnet",
            LlmProvider::Grok => "grok-2",
            LlmProvider::DeepSeek => "deepseek-chat",
        }
    }

    /// API root for the OpenAI-compatible providers
    fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "https://api.anthropic.com/v1",
            LlmProvider::OpenAI => "https://api.openai.com/v1",
            LlmProvider::OpenRouter => "https://openrouter.ai/api/v1",
            LlmProvider::Grok => "https://api.x.ai/v1",
            LlmProvider::DeepSeek => "https://api.deepseek.com/v1",
        }
    }

    /// Whether this provider supports custom base URL
    pub fn supports_base_url(&self) -> bool {
        matches!(self, LlmProvider::OpenAI)
    }
}

/// Configuration for LLM model selection
///
/// ## Example
/// ```rust,ignore
/// use paperlab_core::models::{ModelConfig, LlmProvider};
///
/// let config = ModelConfig::with_provider(LlmProvider::OpenAI, "gpt-4o");
/// let gateway = config.create_gateway()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelConfig {
    /// LLM provider to use
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model name (e.g., "claude-sonnet-4-20250514", "gpt-4o")
    pub model: String,
    /// Optional base URL override for OpenAI-compatible APIs
    #[serde(default)]
    pub base_url: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::with_provider(LlmProvider::Anthropic, LlmProvider::Anthropic.default_model())
    }
}

impl ModelConfig {
    /// Create config for a specific provider
    pub fn with_provider(provider: LlmProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            base_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Set base URL (for OpenAI-compatible endpoints)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Base URL the gateway will talk to, honoring the override where supported
    pub fn effective_base_url(&self) -> String {
        match &self.base_url {
            Some(url) if self.provider.supports_base_url() => {
                url.trim_end_matches('/').to_string()
            }
            _ => self.provider.default_base_url().to_string(),
        }
    }

    /// Create the shared gateway for the configured provider.
    ///
    /// Reads the provider's API key from the environment.
    pub fn create_gateway(&self) -> anyhow::Result<Arc<dyn Gateway>> {
        let env = self.provider.api_key_env();
        let api_key = std::env::var(env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .with_context(|| format!("{} is not set", env))?;
        let timeout = Duration::from_secs(self.request_timeout_secs);

        let gateway: Arc<dyn Gateway> = match self.provider {
            LlmProvider::Anthropic => Arc::new(AnthropicGateway::new(
                api_key,
                &self.model,
                self.effective_base_url(),
                timeout,
            )?),
            _ => Arc::new(OpenAiCompatGateway::new(
                api_key,
                &self.model,
                self.effective_base_url(),
                timeout,
            )?),
        };
        Ok(gateway)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert_eq!(config.provider, LlmProvider::Anthropic);
        assert!(config.model.contains("claude"));
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_provider_display_names() {
        assert_eq!(LlmProvider::Anthropic.display_name(), "Anthropic");
        assert_eq!(LlmProvider::OpenAI.display_name(), "OpenAI");
    }

    #[test]
    fn test_provider_ids_round_trip() {
        for provider in LlmProvider::all() {
            assert_eq!(LlmProvider::from_id(provider.id()), Some(provider));
        }
        assert_eq!(LlmProvider::from_id("XAI"), Some(LlmProvider::Grok));
        assert_eq!(LlmProvider::from_id("gemini"), None);
    }

    #[test]
    fn test_base_url_only_honored_for_openai() {
        let openai = ModelConfig::with_provider(LlmProvider::OpenAI, "gpt-4o")
            .with_base_url("http://localhost:11434/v1/");
        assert_eq!(openai.effective_base_url(), "http://localhost:11434/v1");

        let anthropic = ModelConfig::default().with_base_url("http://localhost:1234");
        assert_eq!(anthropic.effective_base_url(), "https://api.anthropic.com/v1");
    }

    #[test]
    fn test_model_config_serialization() {
        let config = ModelConfig::with_provider(LlmProvider::OpenAI, "gpt-4o");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("openai"));
        assert!(json.contains("gpt-4o"));

        let parsed: ModelConfig =
            serde_json::from_str(r#"{"provider":"deepseek","model":"deepseek-chat"}"#).unwrap();
        assert_eq!(parsed.provider, LlmProvider::DeepSeek);
        assert_eq!(parsed.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }
}
