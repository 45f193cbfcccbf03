//! # Pipeline Stages
//!
//! Defines the stages of an analysis run.

use serde::{Deserialize, Serialize};

/// Stage of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Three stance evaluations of the document
    Evaluating,
    /// Synthesizing the evaluations
    Aggregating,
    /// Proposing and parsing research directions
    ExtractingDirections,
    /// Maturing, criticizing and debating each direction
    DevelopingHypotheses,
    /// Picking the best hypothesis
    Judging,
    /// Complete
    Complete,
    /// Failed
    Failed,
}

impl PipelineStage {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Evaluating => "Evaluating paper",
            PipelineStage::Aggregating => "Summarizing evaluations",
            PipelineStage::ExtractingDirections => "Finding research directions",
            PipelineStage::DevelopingHypotheses => "Developing hypotheses",
            PipelineStage::Judging => "Judging hypotheses",
            PipelineStage::Complete => "Complete",
            PipelineStage::Failed => "Failed",
        }
    }
}

/// The pipeline state machine
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Current stage
    pub stage: PipelineStage,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            stage: PipelineStage::Evaluating,
        }
    }
}

impl Pipeline {
    /// Create a new pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to the next stage
    pub fn advance(&mut self) {
        self.stage = match self.stage {
            PipelineStage::Evaluating => PipelineStage::Aggregating,
            PipelineStage::Aggregating => PipelineStage::ExtractingDirections,
            PipelineStage::ExtractingDirections => PipelineStage::DevelopingHypotheses,
            PipelineStage::DevelopingHypotheses => PipelineStage::Judging,
            PipelineStage::Judging => PipelineStage::Complete,
            PipelineStage::Complete => PipelineStage::Complete,
            PipelineStage::Failed => PipelineStage::Failed,
        };
    }

    /// Fail the pipeline
    pub fn fail(&mut self) {
        self.stage = PipelineStage::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_advance() {
        let mut pipeline = Pipeline::new();
        assert_eq!(pipeline.stage, PipelineStage::Evaluating);

        let expected = [
            PipelineStage::Aggregating,
            PipelineStage::ExtractingDirections,
            PipelineStage::DevelopingHypotheses,
            PipelineStage::Judging,
            PipelineStage::Complete,
            PipelineStage::Complete,
        ];
        for stage in expected {
            pipeline.advance();
            assert_eq!(pipeline.stage, stage);
        }
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut pipeline = Pipeline::new();
        pipeline.advance();
        pipeline.fail();
        assert_eq!(pipeline.stage, PipelineStage::Failed);

        pipeline.advance();
        assert_eq!(pipeline.stage, PipelineStage::Failed);
    }
}
