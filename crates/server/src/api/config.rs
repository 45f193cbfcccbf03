//! # Config API
//!
//! Persisted server settings in `.paperlab/config.json`, plus provider
//! discovery for clients choosing a model.

use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use paperlab_core::models::{LlmProvider, ModelConfig};
use paperlab_core::state::io::{get_runtime_path, read_optional, write_file};
use paperlab_core::swarm::CoordinatorConfig;

use super::{reject, ApiError, ApiResponse, SharedState};

/// File name of the persisted config inside the runtime directory
pub const CONFIG_FILE: &str = "config.json";

/// Default location of the persisted config
pub fn default_config_path() -> PathBuf {
    get_runtime_path().join(CONFIG_FILE)
}

/// Persisted configuration (the subset of `CoordinatorConfig` clients may change)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema)]
pub struct PersistedConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debate_rounds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_document_chars: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_hypotheses: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_debates: Option<usize>,
}

impl PersistedConfig {
    /// Load from `path`; a missing or unreadable file yields the empty config
    pub async fn load_from(path: &Path) -> Self {
        match read_optional(path).await {
            Ok(Some(content)) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = ?path, error = %e, "ignoring malformed config");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "failed to read config");
                Self::default()
            }
        }
    }

    pub async fn load() -> Self {
        Self::load_from(&default_config_path()).await
    }

    pub async fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        write_file(path, &content).await
    }

    /// Overwrite every field `other` sets, keep the rest
    pub fn merge(&mut self, other: PersistedConfig) {
        if other.provider.is_some() {
            self.provider = other.provider;
        }
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.request_timeout_secs.is_some() {
            self.request_timeout_secs = other.request_timeout_secs;
        }
        if other.debate_rounds.is_some() {
            self.debate_rounds = other.debate_rounds;
        }
        if other.max_document_chars.is_some() {
            self.max_document_chars = other.max_document_chars;
        }
        if other.max_concurrent_hypotheses.is_some() {
            self.max_concurrent_hypotheses = other.max_concurrent_hypotheses;
        }
        if other.max_concurrent_debates.is_some() {
            self.max_concurrent_debates = other.max_concurrent_debates;
        }
    }

    /// Resolve into a full coordinator config over the built-in defaults.
    ///
    /// A provider change without a model picks that provider's default model.
    pub fn to_coordinator_config(&self) -> anyhow::Result<CoordinatorConfig> {
        let mut config = CoordinatorConfig::default();

        let provider = match &self.provider {
            Some(id) => LlmProvider::from_id(id)
                .with_context(|| format!("Unknown provider: {:?}", id))?,
            None => config.model.provider,
        };
        let model = self
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());

        let mut model_config = ModelConfig::with_provider(provider, model);
        if let Some(url) = &self.base_url {
            model_config = model_config.with_base_url(url);
        }
        if let Some(secs) = self.request_timeout_secs {
            model_config.request_timeout_secs = secs;
        }
        config.model = model_config;

        if let Some(rounds) = self.debate_rounds {
            config.debate_rounds = rounds;
        }
        if let Some(chars) = self.max_document_chars {
            config.max_document_chars = chars;
        }
        if let Some(n) = self.max_concurrent_hypotheses {
            config.max_concurrent_hypotheses = n.max(1);
        }
        if let Some(n) = self.max_concurrent_debates {
            config.max_concurrent_debates = n.max(1);
        }
        Ok(config)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConfigResponse {
    pub config: PersistedConfig,
    pub defaults: ConfigDefaults,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConfigDefaults {
    pub provider: &'static str,
    pub model: &'static str,
    pub request_timeout_secs: u64,
    pub debate_rounds: u32,
    pub max_document_chars: usize,
    pub max_concurrent_hypotheses: usize,
    pub max_concurrent_debates: usize,
}

impl Default for ConfigDefaults {
    fn default() -> Self {
        let config = CoordinatorConfig::default();
        let provider = config.model.provider;
        Self {
            provider: provider.id(),
            model: provider.default_model(),
            request_timeout_secs: config.model.request_timeout_secs,
            debate_rounds: config.debate_rounds,
            max_document_chars: config.max_document_chars,
            max_concurrent_hypotheses: config.max_concurrent_hypotheses,
            max_concurrent_debates: config.max_concurrent_debates,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub default_model: String,
    pub supports_base_url: bool,
    pub env_var: String,
    /// Whether the key variable is set in this process
    pub configured: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderInfo>,
}

fn provider_info() -> Vec<ProviderInfo> {
    LlmProvider::all()
        .into_iter()
        .map(|p| ProviderInfo {
            id: p.id().to_string(),
            name: p.display_name().to_string(),
            default_model: p.default_model().to_string(),
            supports_base_url: p.supports_base_url(),
            env_var: p.api_key_env().to_string(),
            configured: std::env::var(p.api_key_env())
                .map(|k| !k.trim().is_empty())
                .unwrap_or(false),
        })
        .collect()
}

pub fn config_routes() -> Router<SharedState> {
    Router::new()
        .route("/config", get(get_config).patch(update_config))
        .route("/providers", get(get_providers))
}

/// Get the persisted configuration and the built-in defaults
#[utoipa::path(
    get,
    path = "/api/v1/config",
    tag = "config",
    responses(
        (status = 200, description = "Current configuration and defaults", body = ConfigResponse)
    )
)]
pub async fn get_config(State(state): State<SharedState>) -> Json<ConfigResponse> {
    let config = PersistedConfig::load_from(&state.config_path).await;
    Json(ConfigResponse {
        config,
        defaults: ConfigDefaults::default(),
    })
}

/// Update configuration (partial merge)
#[utoipa::path(
    patch,
    path = "/api/v1/config",
    tag = "config",
    request_body = PersistedConfig,
    responses(
        (status = 200, description = "Updated configuration", body = ConfigResponse),
        (status = 400, description = "Merged configuration is invalid", body = ApiResponse),
        (status = 500, description = "Configuration could not be saved", body = ApiResponse)
    )
)]
pub async fn update_config(
    State(state): State<SharedState>,
    Json(updates): Json<PersistedConfig>,
) -> Result<Json<ConfigResponse>, ApiError> {
    let mut config = PersistedConfig::load_from(&state.config_path).await;
    config.merge(updates);

    // Only configs a run can start from are written
    config
        .to_coordinator_config()
        .map_err(|e| reject(StatusCode::BAD_REQUEST, e.to_string()))?;

    config.save_to(&state.config_path).await.map_err(|e| {
        tracing::error!(error = %e, "failed to save config");
        reject(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
    })?;

    Ok(Json(ConfigResponse {
        config,
        defaults: ConfigDefaults::default(),
    }))
}

/// Get available LLM providers
#[utoipa::path(
    get,
    path = "/api/v1/providers",
    tag = "providers",
    responses(
        (status = 200, description = "List of supported LLM providers", body = ProvidersResponse)
    )
)]
pub async fn get_providers() -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: provider_info(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut config = PersistedConfig {
            provider: Some("openai".to_string()),
            model: Some("gpt-4o".to_string()),
            debate_rounds: Some(2),
            ..Default::default()
        };
        config.merge(PersistedConfig {
            model: Some("gpt-4o-mini".to_string()),
            max_concurrent_debates: Some(4),
            ..Default::default()
        });

        assert_eq!(config.provider.as_deref(), Some("openai"));
        assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.debate_rounds, Some(2));
        assert_eq!(config.max_concurrent_debates, Some(4));
        assert_eq!(config.base_url, None);
    }

    #[test]
    fn test_empty_config_resolves_to_defaults() {
        let resolved = PersistedConfig::default().to_coordinator_config().unwrap();
        assert_eq!(resolved, CoordinatorConfig::default());
    }

    #[test]
    fn test_provider_without_model_uses_provider_default() {
        let config = PersistedConfig {
            provider: Some("deepseek".to_string()),
            debate_rounds: Some(1),
            max_concurrent_hypotheses: Some(0),
            ..Default::default()
        };
        let resolved = config.to_coordinator_config().unwrap();
        assert_eq!(resolved.model.provider, LlmProvider::DeepSeek);
        assert_eq!(resolved.model.model, "deepseek-chat");
        assert_eq!(resolved.debate_rounds, 1);
        assert_eq!(resolved.max_concurrent_hypotheses, 1);
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let config = PersistedConfig {
            provider: Some("mystery".to_string()),
            ..Default::default()
        };
        let err = config.to_coordinator_config().unwrap_err();
        assert!(err.to_string().contains("mystery"));
    }

    #[test]
    fn test_serialization_skips_unset_fields() {
        let config = PersistedConfig {
            model: Some("grok-2".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"model":"grok-2"}"#);
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        assert_eq!(PersistedConfig::load_from(&path).await, PersistedConfig::default());

        let config = PersistedConfig {
            provider: Some("anthropic".to_string()),
            debate_rounds: Some(5),
            ..Default::default()
        };
        config.save_to(&path).await.unwrap();
        assert_eq!(PersistedConfig::load_from(&path).await, config);

        tokio::fs::write(&path, "not json").await.unwrap();
        assert_eq!(PersistedConfig::load_from(&path).await, PersistedConfig::default());
    }

    fn test_state(dir: &tempfile::TempDir, config_path: PathBuf) -> SharedState {
        std::sync::Arc::new(crate::api::AppState::new(
            paperlab_core::state::RunArchive::new(dir.path().join("runs")),
            config_path,
        ))
    }

    #[tokio::test]
    async fn test_update_config_merges_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let state = test_state(&dir, path.clone());

        let updates = PersistedConfig {
            provider: Some("openai".to_string()),
            debate_rounds: Some(2),
            ..Default::default()
        };
        let Json(response) = update_config(State(state), Json(updates.clone()))
            .await
            .unwrap();
        assert_eq!(response.config, updates);
        assert_eq!(PersistedConfig::load_from(&path).await, updates);
    }

    #[tokio::test]
    async fn test_update_config_rejects_unknown_provider_without_saving() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let state = test_state(&dir, path.clone());

        let updates = PersistedConfig {
            provider: Some("mystery".to_string()),
            ..Default::default()
        };
        let (code, body) = update_config(State(state), Json(updates)).await.unwrap_err();
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert!(body.0.message.contains("mystery"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_update_config_reports_save_failure() {
        let dir = tempfile::tempdir().unwrap();
        // The parent of the config path is a regular file, so it cannot be created
        let blocker = dir.path().join("blocker");
        tokio::fs::write(&blocker, "x").await.unwrap();
        let state = test_state(&dir, blocker.join(CONFIG_FILE));

        let updates = PersistedConfig {
            debate_rounds: Some(4),
            ..Default::default()
        };
        let (code, body) = update_config(State(state), Json(updates)).await.unwrap_err();
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.0.success);
    }

    #[test]
    fn test_provider_info_lists_every_provider() {
        let ids: Vec<_> = provider_info().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["anthropic", "openai", "openrouter", "grok", "deepseek"]);
    }
}
