//! # Swarm Coordinator
//!
//! Drives one analysis run from document to judgement. Each step returns
//! its own record which is threaded into the next; nothing is shared and
//! mutated across steps.
//!
//! Hypotheses (and the debates inside each one) run as bounded task sets.
//! Handles are awaited in spawn order, so output order always matches
//! input order no matter which task finishes first.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use crate::error::PipelineError;
use crate::gateway::Gateway;
use crate::models::ModelConfig;
use crate::skills::{
    AggregatorSkill, CriticSkill, DebateSkill, DebateSummarySkill, DirectionSkill,
    EvaluatorSkill, JudgeSkill, MaturerSkill,
};
use crate::state::{
    AbstractOutcome, AnalysisReport, Criticism, Direction, Hypothesis, SummaryOutcome, Transcript,
};

use super::events::{EventSink, PipelineEvent, PipelineEventKind};
use super::pipeline::{Pipeline, PipelineStage};

/// Maximum output tokens per step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StepBudgets {
    pub evaluation: u32,
    pub aggregation: u32,
    pub directions: u32,
    pub maturation: u32,
    pub criticism: u32,
    pub debate: u32,
    pub debate_summary: u32,
    pub judgement: u32,
}

impl Default for StepBudgets {
    fn default() -> Self {
        Self {
            evaluation: 3000,
            aggregation: 2000,
            directions: 1000,
            maturation: 1800,
            criticism: 1500,
            debate: 600,
            debate_summary: 400,
            judgement: 2500,
        }
    }
}

/// Configuration for the coordinator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Model every agent talks to
    pub model: ModelConfig,
    /// Per-step output token caps
    pub budgets: StepBudgets,
    /// Document length cap (characters) when embedded in prompts
    pub max_document_chars: usize,
    /// Support/refute rounds per criticism
    pub debate_rounds: u32,
    /// Directions developed at once (1 = strictly sequential)
    pub max_concurrent_hypotheses: usize,
    /// Debates per hypothesis run at once (1 = strictly sequential)
    pub max_concurrent_debates: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            budgets: StepBudgets::default(),
            max_document_chars: 15000,
            debate_rounds: 3,
            max_concurrent_hypotheses: 1,
            max_concurrent_debates: 1,
        }
    }
}

/// Everything a hypothesis task needs, shared read-only across tasks
struct HypothesisWorker {
    gateway: Arc<dyn Gateway>,
    document: Arc<str>,
    budgets: StepBudgets,
    max_document_chars: usize,
    debate_rounds: u32,
    max_concurrent_debates: usize,
    events: EventSink,
}

/// The analysis coordinator
pub struct Coordinator {
    config: CoordinatorConfig,
    gateway: Arc<dyn Gateway>,
    pipeline: Pipeline,
    events: EventSink,
}

impl Coordinator {
    /// Create a coordinator over an existing gateway
    pub fn new(config: CoordinatorConfig, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            config,
            gateway,
            pipeline: Pipeline::new(),
            events: EventSink::none(),
        }
    }

    /// Create a coordinator whose gateway is built from `config.model`
    pub fn from_config(config: CoordinatorConfig) -> anyhow::Result<Self> {
        let gateway = config.model.create_gateway()?;
        Ok(Self::new(config, gateway))
    }

    /// Set event channel for streaming events
    pub fn with_event_channel(mut self, tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.events = EventSink::new(tx);
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Current pipeline stage
    pub fn stage(&self) -> PipelineStage {
        self.pipeline.stage
    }

    /// Emit an event
    async fn emit(&self, kind: PipelineEventKind, agent: &str, data: serde_json::Value) {
        self.events
            .emit(
                PipelineEvent::new(kind, agent)
                    .with_stage(self.pipeline.stage)
                    .with_data(data),
            )
            .await;
    }

    async fn start_stage(&self) {
        tracing::info!(stage = ?self.pipeline.stage, "{}", self.pipeline.stage.label());
        self.emit(
            PipelineEventKind::StageStarted,
            "coordinator",
            serde_json::json!({ "label": self.pipeline.stage.label() }),
        )
        .await;
    }

    async fn complete_stage(&mut self, data: serde_json::Value) {
        self.emit(PipelineEventKind::StageCompleted, "coordinator", data)
            .await;
        self.pipeline.advance();
    }

    /// Run the full pipeline over one document
    #[tracing::instrument(skip(self, document), fields(document_chars = document.len()))]
    pub async fn run(&mut self, document: &str) -> Result<AnalysisReport, PipelineError> {
        self.pipeline = Pipeline::new();
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now();

        self.emit(
            PipelineEventKind::PipelineStarted,
            "coordinator",
            serde_json::json!({ "run_id": run_id, "model": self.gateway.model() }),
        )
        .await;

        let result = if document.trim().is_empty() {
            Err(PipelineError::EmptyDocument)
        } else {
            self.run_stages(document, run_id.clone(), started_at).await
        };

        match &result {
            Ok(report) => {
                self.emit(
                    PipelineEventKind::PipelineCompleted,
                    "coordinator",
                    serde_json::json!({
                        "run_id": report.id,
                        "chosen_title": report.judgement.chosen_title,
                    }),
                )
                .await;
                tracing::info!(run_id = %report.id, "run complete");
            }
            Err(e) => {
                let failed_stage = self.pipeline.stage;
                self.pipeline.fail();
                self.emit(
                    PipelineEventKind::PipelineFailed,
                    "coordinator",
                    serde_json::json!({
                        "run_id": run_id,
                        "failed_stage": failed_stage,
                        "error": e.to_string(),
                    }),
                )
                .await;
                tracing::error!(error = %e, stage = ?failed_stage, "run failed");
            }
        }
        result
    }

    async fn run_stages(
        &mut self,
        document: &str,
        run_id: String,
        started_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<AnalysisReport, PipelineError> {
        let budgets = self.config.budgets.clone();
        let max_chars = self.config.max_document_chars;

        // Stage 1: Evaluate under each stance
        self.start_stage().await;
        let evaluations =
            EvaluatorSkill::run_all(document, self.gateway.as_ref(), budgets.evaluation, max_chars)
                .await?;
        self.complete_stage(serde_json::json!({ "evaluations": 3 }))
            .await;

        // Stage 2: Synthesize
        self.start_stage().await;
        let synthesis =
            AggregatorSkill::run(&evaluations, self.gateway.as_ref(), budgets.aggregation).await?;
        self.complete_stage(serde_json::json!({ "chars": synthesis.len() }))
            .await;

        // Stage 3: Branch into directions
        self.start_stage().await;
        let directions = DirectionSkill::run(
            document,
            &synthesis,
            self.gateway.as_ref(),
            budgets.directions,
            max_chars,
        )
        .await?;
        let titles: Vec<&str> = directions.iter().map(|d| d.title.as_str()).collect();
        self.complete_stage(serde_json::json!({ "directions": titles }))
            .await;

        // Stage 4: Mature, criticize and debate each direction
        self.start_stage().await;
        let hypotheses = self.develop_hypotheses(document, &directions).await;
        let matured = hypotheses.iter().filter(|h| h.is_matured()).count();
        self.complete_stage(serde_json::json!({
            "hypotheses": hypotheses.len(),
            "matured": matured,
        }))
        .await;

        // Stage 5: Judge
        self.start_stage().await;
        let judgement =
            JudgeSkill::run(&hypotheses, self.gateway.as_ref(), budgets.judgement).await?;
        self.complete_stage(serde_json::json!({ "chosen_title": judgement.chosen_title }))
            .await;

        Ok(AnalysisReport {
            id: run_id,
            model: self.gateway.model().to_string(),
            started_at,
            finished_at: chrono::Utc::now(),
            evaluations,
            synthesis,
            directions,
            hypotheses,
            judgement,
        })
    }

    /// Develop every direction with bounded concurrency.
    ///
    /// Permits are taken before spawning, so with a limit of 1 each
    /// direction finishes before the next one starts.
    async fn develop_hypotheses(
        &self,
        document: &str,
        directions: &[Direction],
    ) -> Vec<Hypothesis> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_hypotheses.max(1)));
        let worker = Arc::new(HypothesisWorker {
            gateway: Arc::clone(&self.gateway),
            document: Arc::from(document),
            budgets: self.config.budgets.clone(),
            max_document_chars: self.config.max_document_chars,
            debate_rounds: self.config.debate_rounds,
            max_concurrent_debates: self.config.max_concurrent_debates.max(1),
            events: self.events.clone(),
        });

        let mut handles = Vec::new();

        for direction in directions {
            let permit = semaphore.clone().acquire_owned().await.ok();
            let worker = Arc::clone(&worker);
            let task_direction = direction.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit; // Hold permit until task completes
                worker.develop(task_direction).await
            });
            handles.push((direction.clone(), handle));
        }

        // Await all hypothesis tasks
        let mut hypotheses = Vec::with_capacity(handles.len());
        for (direction, handle) in handles {
            match handle.await {
                Ok(hypothesis) => hypotheses.push(hypothesis),
                Err(e) => {
                    tracing::error!(direction = %direction.title, error = %e, "hypothesis task died");
                    hypotheses.push(Hypothesis {
                        direction,
                        abstract_outcome: AbstractOutcome::Failed {
                            reason: format!("task failed: {}", e),
                        },
                        criticisms: Vec::new(),
                    });
                }
            }
        }
        hypotheses
    }
}

impl HypothesisWorker {
    async fn emit(&self, kind: PipelineEventKind, agent: &str, data: serde_json::Value) {
        self.events
            .emit(
                PipelineEvent::new(kind, agent)
                    .with_stage(PipelineStage::DevelopingHypotheses)
                    .with_data(data),
            )
            .await;
    }

    /// Mature one direction, then criticize and debate it
    async fn develop(self: Arc<Self>, direction: Direction) -> Hypothesis {
        let title = direction.title.clone();

        self.emit(
            PipelineEventKind::AgentStarted,
            "maturer",
            serde_json::json!({ "hypothesis": title }),
        )
        .await;
        let abstract_outcome = MaturerSkill::run(
            &direction,
            &self.document,
            self.gateway.as_ref(),
            self.budgets.maturation,
            self.max_document_chars,
        )
        .await;

        let abstract_text = match &abstract_outcome {
            AbstractOutcome::Matured { text } => {
                self.emit(
                    PipelineEventKind::AgentCompleted,
                    "maturer",
                    serde_json::json!({ "hypothesis": title }),
                )
                .await;
                text.clone()
            }
            AbstractOutcome::Failed { reason } => {
                self.emit(
                    PipelineEventKind::AgentFailed,
                    "maturer",
                    serde_json::json!({ "hypothesis": title, "error": reason }),
                )
                .await;
                return Hypothesis {
                    direction,
                    abstract_outcome,
                    criticisms: Vec::new(),
                };
            }
        };

        let criticism_texts = CriticSkill::run(
            &title,
            &abstract_text,
            self.gateway.as_ref(),
            self.budgets.criticism,
        )
        .await;
        self.emit(
            PipelineEventKind::AgentCompleted,
            "critic",
            serde_json::json!({ "hypothesis": title, "criticisms": criticism_texts.len() }),
        )
        .await;

        let criticisms = self.debate_all(criticism_texts, Arc::from(abstract_text)).await;

        Hypothesis {
            direction,
            abstract_outcome,
            criticisms,
        }
    }

    /// Debate and summarize every criticism, one task per criticism
    async fn debate_all(
        self: &Arc<Self>,
        criticism_texts: Vec<String>,
        abstract_text: Arc<str>,
    ) -> Vec<Criticism> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_debates));
        let mut handles = Vec::new();

        for text in criticism_texts {
            let permit = semaphore.clone().acquire_owned().await.ok();
            let worker = Arc::clone(self);
            let abstract_text = Arc::clone(&abstract_text);
            let task_text = text.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let transcript = DebateSkill::run(
                    &task_text,
                    &abstract_text,
                    worker.debate_rounds,
                    worker.gateway.as_ref(),
                    worker.budgets.debate,
                    &worker.events,
                )
                .await;
                let summary = DebateSummarySkill::run(
                    &transcript,
                    worker.gateway.as_ref(),
                    worker.budgets.debate_summary,
                )
                .await;
                if let SummaryOutcome::Failed { reason } = &summary {
                    worker
                        .emit(
                            PipelineEventKind::AgentFailed,
                            "debate_summarizer",
                            serde_json::json!({ "error": reason }),
                        )
                        .await;
                }
                Criticism {
                    text: task_text,
                    transcript,
                    summary,
                }
            });
            handles.push((text, handle));
        }

        let mut criticisms = Vec::with_capacity(handles.len());
        for (text, handle) in handles {
            match handle.await {
                Ok(criticism) => criticisms.push(criticism),
                Err(e) => {
                    tracing::error!(error = %e, "debate task died");
                    criticisms.push(Criticism {
                        transcript: Transcript::new(text.clone()),
                        text,
                        summary: SummaryOutcome::Failed {
                            reason: format!("task failed: {}", e),
                        },
                    });
                }
            }
        }
        criticisms
    }
}
