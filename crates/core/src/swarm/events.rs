//! # Pipeline Events
//!
//! Progress events streamed out of a run while it executes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::pipeline::PipelineStage;

/// Kind of pipeline event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineEventKind {
    /// Run accepted a document
    PipelineStarted,
    /// Coordinator entered a stage
    StageStarted,
    /// Coordinator left a stage successfully
    StageCompleted,
    /// Agent started working
    AgentStarted,
    /// Agent completed successfully
    AgentCompleted,
    /// Agent failed; recorded inline, the run continues
    AgentFailed,
    /// One debate argument was appended to a transcript
    DebateTurn,
    /// Report is ready
    PipelineCompleted,
    /// Run aborted
    PipelineFailed,
}

/// An event in the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// Unique event ID
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: PipelineEventKind,
    /// Agent (or "coordinator") that produced this event
    pub agent: String,
    /// Stage the coordinator was in
    #[serde(default)]
    pub stage: Option<PipelineStage>,
    /// Associated data (JSON)
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl PipelineEvent {
    /// Create a new event
    pub fn new(kind: PipelineEventKind, agent: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
            agent: agent.to_string(),
            stage: None,
            data: None,
        }
    }

    pub fn with_stage(mut self, stage: PipelineStage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Add data to the event
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Optional event channel, cheap to clone into spawned tasks.
///
/// A closed or missing receiver never fails the run.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Sink that drops everything
    pub fn none() -> Self {
        Self::default()
    }

    pub async fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = PipelineEvent::new(PipelineEventKind::AgentStarted, "critic")
            .with_stage(PipelineStage::DevelopingHypotheses)
            .with_data(serde_json::json!({"hypothesis": "Mechanism X"}));

        assert_eq!(event.agent, "critic");
        assert_eq!(event.stage, Some(PipelineStage::DevelopingHypotheses));
        assert_eq!(event.id.len(), 36);
    }

    #[test]
    fn test_event_serializes_snake_case() {
        let event = PipelineEvent::new(PipelineEventKind::DebateTurn, "debater");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "debate_turn");
        assert!(json["stage"].is_null());
    }

    #[tokio::test]
    async fn test_sink_forwards_and_tolerates_closed_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = EventSink::new(tx);
        sink.emit(PipelineEvent::new(PipelineEventKind::PipelineStarted, "coordinator"))
            .await;
        assert_eq!(
            rx.recv().await.map(|e| e.kind),
            Some(PipelineEventKind::PipelineStarted)
        );

        drop(rx);
        sink.emit(PipelineEvent::new(PipelineEventKind::PipelineFailed, "coordinator"))
            .await;
        EventSink::none()
            .emit(PipelineEvent::new(PipelineEventKind::PipelineFailed, "coordinator"))
            .await;
    }
}
