//! # Swarm Orchestration
//!
//! Coordinates the agent pipeline for PaperLab.
//!
//! ## Pipeline Flow
//!
//! ```text
//! Document → Evaluator ×3 → Aggregator → Direction Finder
//!          → per direction: Maturer → Critic → per criticism: Debate ⟷ → Summary
//!          → Judge
//! ```

pub mod coordinator;
pub mod events;
pub mod pipeline;

pub use coordinator::{Coordinator, CoordinatorConfig, StepBudgets};
pub use events::{EventSink, PipelineEvent, PipelineEventKind};
pub use pipeline::{Pipeline, PipelineStage};
