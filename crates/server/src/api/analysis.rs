//! # Analysis API
//!
//! Starts one pipeline run at a time in the background, streams its events
//! over SSE, and serves the finished report and the run archive.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use utoipa::ToSchema;

use paperlab_core::state::{AnalysisReport, RunSummary};
use paperlab_core::swarm::{Coordinator, PipelineEvent, PipelineEventKind};

use super::config::PersistedConfig;
use super::{reject, ApiError, ApiResponse, SharedState};

const HEARTBEAT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct AnalysisStatus {
    pub state: RunState,
    pub run_id: Option<String>,
    /// Label of the stage currently executing
    pub stage: Option<String>,
    pub active_agent: Option<String>,
    pub error: Option<String>,
}

impl AnalysisStatus {
    fn running() -> Self {
        Self {
            state: RunState::Running,
            ..Default::default()
        }
    }

    /// Fold one pipeline event into the status
    fn observe(&mut self, event: &PipelineEvent) {
        match event.kind {
            PipelineEventKind::PipelineStarted => {
                self.run_id = event
                    .data
                    .as_ref()
                    .and_then(|d| d.get("run_id"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
            }
            PipelineEventKind::StageStarted => {
                self.stage = event.stage.map(|s| s.label().to_string());
            }
            PipelineEventKind::AgentStarted => {
                self.active_agent = Some(event.agent.clone());
            }
            PipelineEventKind::AgentCompleted | PipelineEventKind::AgentFailed => {
                if self.active_agent.as_deref() == Some(event.agent.as_str()) {
                    self.active_agent = None;
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartAnalysisRequest {
    /// Full text of the paper
    pub document: String,
    /// Overrides applied on top of the persisted config for this run only
    pub settings: Option<PersistedConfig>,
}

pub fn analysis_routes() -> Router<SharedState> {
    Router::new()
        .route("/start", post(start_analysis))
        .route("/status", get(get_status))
        .route("/events", get(events))
        .route("/report", get(get_report))
}

pub fn run_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_runs))
        .route("/:id", get(get_run))
}

/// Start an analysis run in the background
#[utoipa::path(
    post,
    path = "/api/v1/analysis/start",
    tag = "analysis",
    request_body = StartAnalysisRequest,
    responses(
        (status = 200, description = "Run started", body = ApiResponse),
        (status = 400, description = "Empty document or invalid settings", body = ApiResponse),
        (status = 409, description = "A run is already in progress", body = ApiResponse)
    )
)]
pub async fn start_analysis(
    State(state): State<SharedState>,
    Json(req): Json<StartAnalysisRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    if req.document.trim().is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "Document is empty"));
    }

    let mut persisted = PersistedConfig::load_from(&state.config_path).await;
    if let Some(settings) = req.settings {
        persisted.merge(settings);
    }
    let config = persisted
        .to_coordinator_config()
        .map_err(|e| reject(StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut status = state.status.write().await;
    if status.state == RunState::Running {
        return Err(reject(
            StatusCode::CONFLICT,
            "An analysis is already running",
        ));
    }

    let (tx, rx) = mpsc::channel::<PipelineEvent>(100);
    let coordinator = Coordinator::from_config(config)
        .map_err(|e| reject(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e)))?
        .with_event_channel(tx);
    let model = coordinator.config().model.model.clone();

    *status = AnalysisStatus::running();
    drop(status);

    tracing::info!(model = %model, document_chars = req.document.len(), "starting analysis");
    tokio::spawn(run_analysis(state.clone(), coordinator, rx, req.document));

    Ok(Json(ApiResponse {
        success: true,
        message: format!("Analysis started with {}", model),
    }))
}

/// Drive one run to completion, then archive and publish the report
async fn run_analysis(
    state: SharedState,
    mut coordinator: Coordinator,
    rx: mpsc::Receiver<PipelineEvent>,
    document: String,
) {
    let forwarder = tokio::spawn(forward_events(state.clone(), rx));

    let result = coordinator.run(&document).await;
    let final_stage = coordinator.stage();
    // Closes the event channel so the forwarder drains and exits
    drop(coordinator);
    if let Err(e) = forwarder.await {
        tracing::warn!(error = %e, "event forwarder panicked");
    }

    match result {
        Ok(report) => {
            if let Err(e) = state.archive.save(&report).await {
                tracing::warn!(error = %e, "failed to archive run");
            }
            *state.latest_report.write().await = Some(report);

            let mut status = state.status.write().await;
            status.state = RunState::Complete;
            status.stage = Some(final_stage.label().to_string());
            status.active_agent = None;
        }
        Err(e) => {
            tracing::error!(error = %e, "analysis failed");
            let mut status = state.status.write().await;
            status.state = RunState::Failed;
            status.stage = Some(final_stage.label().to_string());
            status.active_agent = None;
            status.error = Some(e.to_string());
        }
    }
}

/// Bridge coordinator events into the status and the SSE broadcast
async fn forward_events(state: SharedState, mut rx: mpsc::Receiver<PipelineEvent>) {
    while let Some(event) = rx.recv().await {
        state.status.write().await.observe(&event);
        // No subscribers is fine
        let _ = state.event_tx.send(event);
    }
}

/// Get analysis status
#[utoipa::path(
    get,
    path = "/api/v1/analysis/status",
    tag = "analysis",
    responses(
        (status = 200, description = "Current run status", body = AnalysisStatus)
    )
)]
pub async fn get_status(State(state): State<SharedState>) -> Json<AnalysisStatus> {
    Json(state.status.read().await.clone())
}

/// SSE stream of pipeline events with a heartbeat comment every 15 seconds
#[utoipa::path(
    get,
    path = "/api/v1/analysis/events",
    tag = "analysis",
    responses(
        (status = 200, description = "Server-sent pipeline events", content_type = "text/event-stream")
    )
)]
pub async fn events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_tx.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        match tokio::time::timeout(HEARTBEAT, rx.recv()).await {
            Ok(Ok(event)) => {
                let event = match serde_json::to_string(&event) {
                    Ok(json) => Event::default().event("pipeline").data(json),
                    Err(e) => Event::default().comment(format!("unserializable event: {}", e)),
                };
                Some((Ok(event), rx))
            }
            Ok(Err(RecvError::Lagged(skipped))) => Some((
                Ok(Event::default().comment(format!("lagged {}", skipped))),
                rx,
            )),
            Ok(Err(RecvError::Closed)) => None,
            Err(_) => Some((Ok(Event::default().comment("heartbeat")), rx)),
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Get the report of the latest successful run
#[utoipa::path(
    get,
    path = "/api/v1/analysis/report",
    tag = "analysis",
    responses(
        (status = 200, description = "Latest analysis report (JSON)"),
        (status = 404, description = "No run has finished yet", body = ApiResponse)
    )
)]
pub async fn get_report(
    State(state): State<SharedState>,
) -> Result<Json<AnalysisReport>, ApiError> {
    state
        .latest_report
        .read()
        .await
        .clone()
        .map(Json)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "No report available"))
}

/// List archived runs, newest first
#[utoipa::path(
    get,
    path = "/api/v1/runs",
    tag = "runs",
    responses(
        (status = 200, description = "Archived run summaries (JSON array)"),
        (status = 500, description = "Archive could not be read", body = ApiResponse)
    )
)]
pub async fn list_runs(
    State(state): State<SharedState>,
) -> Result<Json<Vec<RunSummary>>, ApiError> {
    state.archive.list().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "failed to list runs");
        reject(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

/// Get one archived report
#[utoipa::path(
    get,
    path = "/api/v1/runs/{id}",
    tag = "runs",
    params(
        ("id" = String, Path, description = "Run id")
    ),
    responses(
        (status = 200, description = "Archived analysis report (JSON)"),
        (status = 400, description = "Malformed run id", body = ApiResponse),
        (status = 404, description = "No such run", body = ApiResponse)
    )
)]
pub async fn get_run(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisReport>, ApiError> {
    match state.archive.load(&id).await {
        Ok(Some(report)) => Ok(Json(report)),
        Ok(None) => Err(reject(
            StatusCode::NOT_FOUND,
            format!("No run with id {}", id),
        )),
        Err(e) => Err(reject(StatusCode::BAD_REQUEST, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AppState;
    use paperlab_core::state::RunArchive;
    use paperlab_core::swarm::PipelineStage;
    use std::sync::Arc;

    fn test_state(dir: &tempfile::TempDir) -> SharedState {
        Arc::new(AppState::new(
            RunArchive::new(dir.path().join("runs")),
            dir.path().join("config.json"),
        ))
    }

    fn request(document: &str) -> Json<StartAnalysisRequest> {
        Json(StartAnalysisRequest {
            document: document.to_string(),
            settings: None,
        })
    }

    #[tokio::test]
    async fn test_empty_document_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let (code, body) = start_analysis(State(state.clone()), request("  \n "))
            .await
            .unwrap_err();
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert!(!body.0.success);
        assert_eq!(state.status.read().await.state, RunState::Idle);
    }

    #[tokio::test]
    async fn test_second_start_conflicts_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        *state.status.write().await = AnalysisStatus::running();

        let (code, _) = start_analysis(State(state), request("A paper."))
            .await
            .unwrap_err();
        assert_eq!(code, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_invalid_settings_are_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let req = Json(StartAnalysisRequest {
            document: "A paper.".to_string(),
            settings: Some(PersistedConfig {
                provider: Some("nobody".to_string()),
                ..Default::default()
            }),
        });

        let (code, body) = start_analysis(State(state), req).await.unwrap_err();
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert!(body.0.message.contains("nobody"));
    }

    #[tokio::test]
    async fn test_report_is_not_found_before_any_run() {
        let dir = tempfile::tempdir().unwrap();
        let (code, _) = get_report(State(test_state(&dir))).await.unwrap_err();
        assert_eq!(code, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_run_lookup_errors() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let (code, _) = get_run(State(state.clone()), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert_eq!(code, StatusCode::NOT_FOUND);

        let (code, _) = get_run(State(state.clone()), Path("../config".to_string()))
            .await
            .unwrap_err();
        assert_eq!(code, StatusCode::BAD_REQUEST);

        let runs = list_runs(State(state)).await.unwrap();
        assert!(runs.0.is_empty());
    }

    #[test]
    fn test_status_follows_events() {
        let mut status = AnalysisStatus::running();

        status.observe(
            &PipelineEvent::new(PipelineEventKind::PipelineStarted, "coordinator")
                .with_data(serde_json::json!({ "run_id": "run-1" })),
        );
        status.observe(
            &PipelineEvent::new(PipelineEventKind::StageStarted, "coordinator")
                .with_stage(PipelineStage::Aggregating),
        );
        status.observe(&PipelineEvent::new(PipelineEventKind::AgentStarted, "aggregator"));
        assert_eq!(status.run_id.as_deref(), Some("run-1"));
        assert_eq!(status.stage.as_deref(), Some("Summarizing evaluations"));
        assert_eq!(status.active_agent.as_deref(), Some("aggregator"));

        // Another agent finishing leaves the active one alone
        status.observe(&PipelineEvent::new(PipelineEventKind::AgentCompleted, "critic"));
        assert_eq!(status.active_agent.as_deref(), Some("aggregator"));

        status.observe(&PipelineEvent::new(PipelineEventKind::AgentCompleted, "aggregator"));
        assert_eq!(status.active_agent, None);
        assert_eq!(status.state, RunState::Running);
    }

    #[test]
    fn test_status_serializes_lowercase_state() {
        let json = serde_json::to_value(AnalysisStatus::default()).unwrap();
        assert_eq!(json["state"], "idle");
    }
}
