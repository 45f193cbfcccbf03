//! # HTTP API
//!
//! Versioned routes under `/api/v1`, shared application state, and the
//! OpenAPI document served at `/api/v1/openapi.json`.

pub mod analysis;
pub mod config;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Response, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use utoipa::{OpenApi, ToSchema};

use paperlab_core::state::{AnalysisReport, RunArchive};
use paperlab_core::swarm::PipelineEvent;

/// Application state
pub struct AppState {
    pub status: RwLock<analysis::AnalysisStatus>,
    pub event_tx: broadcast::Sender<PipelineEvent>,
    /// Report of the most recent successful run
    pub latest_report: RwLock<Option<AnalysisReport>>,
    pub archive: RunArchive,
    pub config_path: PathBuf,
}

impl AppState {
    pub fn new(archive: RunArchive, config_path: PathBuf) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            status: RwLock::new(analysis::AnalysisStatus::default()),
            event_tx,
            latest_report: RwLock::new(None),
            archive,
            config_path,
        }
    }
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

/// Error half of handler results: a status code plus an [`ApiResponse`] body
pub type ApiError = (StatusCode, Json<ApiResponse>);

pub fn reject(code: StatusCode, message: impl Into<String>) -> ApiError {
    (
        code,
        Json(ApiResponse {
            success: false,
            message: message.into(),
        }),
    )
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PaperLab API",
        version = "1.0.0",
        description = "Paper critique and hypothesis generation pipeline"
    ),
    paths(
        analysis::start_analysis,
        analysis::get_status,
        analysis::events,
        analysis::get_report,
        analysis::list_runs,
        analysis::get_run,
        config::get_config,
        config::update_config,
        config::get_providers
    ),
    components(
        schemas(
            ApiResponse,
            analysis::AnalysisStatus,
            analysis::StartAnalysisRequest,
            config::PersistedConfig,
            config::ConfigResponse,
            config::ConfigDefaults,
            config::ProviderInfo,
            config::ProvidersResponse
        )
    ),
    tags(
        (name = "analysis", description = "Run the pipeline and follow its progress"),
        (name = "runs", description = "Archived reports"),
        (name = "config", description = "Configuration management"),
        (name = "providers", description = "LLM provider discovery")
    )
)]
pub struct ApiDoc;

async fn serve_openapi() -> impl IntoResponse {
    match ApiDoc::openapi().to_json() {
        Ok(doc) => Response::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(doc))
            .map(IntoResponse::into_response)
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Err(e) => {
            tracing::error!(error = %e, "failed to render OpenAPI document");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn router(state: SharedState) -> Router {
    let v1 = Router::new()
        .nest("/analysis", analysis::analysis_routes())
        .nest("/runs", analysis::run_routes())
        .merge(config::config_routes())
        .route("/openapi.json", get(serve_openapi));

    Router::new().nest("/api/v1", v1).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_analysis_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        assert!(paths.contains(&"/api/v1/analysis/start".to_string()));
        assert!(paths.contains(&"/api/v1/runs/{id}".to_string()));
        assert!(paths.contains(&"/api/v1/config".to_string()));
    }
}
