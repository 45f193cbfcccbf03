//! Error types for the analysis pipeline.
//!
//! Gateway failures live in [`crate::gateway::GatewayError`]. Parsing of
//! free-text replies fails with [`ParseError`]. Anything that aborts a run
//! is wrapped in [`PipelineError`], which names the step that failed.

use crate::gateway::GatewayError;
use crate::state::Stance;

/// Steps whose failure aborts a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Evaluation(Stance),
    Aggregation,
    DirectionExtraction,
    Judgement,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Evaluation(stance) => write!(f, "evaluation ({} skepticism)", stance),
            Step::Aggregation => write!(f, "aggregation"),
            Step::DirectionExtraction => write!(f, "direction extraction"),
            Step::Judgement => write!(f, "judgement"),
        }
    }
}

/// A model reply that could not be turned into the expected list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Non-empty reply, but no items recovered. `raw` holds the reply.
    #[error("no {what} could be parsed from the model reply")]
    NoItems { what: &'static str, raw: String },

    /// The model replied with nothing to parse.
    #[error("model returned no {0}")]
    Empty(&'static str),
}

impl ParseError {
    /// Raw reply text, when there was one
    pub fn raw(&self) -> Option<&str> {
        match self {
            ParseError::NoItems { raw, .. } => Some(raw),
            ParseError::Empty(_) => None,
        }
    }
}

/// Fatal pipeline failure.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("{step} failed: {source}")]
    Gateway {
        step: Step,
        #[source]
        source: GatewayError,
    },

    #[error("{step} failed: {source}")]
    Parse {
        step: Step,
        #[source]
        source: ParseError,
    },

    #[error("no matured hypotheses to judge")]
    NoCandidates,
}

impl PipelineError {
    pub fn gateway(step: Step, source: GatewayError) -> Self {
        PipelineError::Gateway { step, source }
    }

    /// Step that failed, if the failure belongs to one
    pub fn step(&self) -> Option<Step> {
        match self {
            PipelineError::Gateway { step, .. } | PipelineError::Parse { step, .. } => Some(*step),
            PipelineError::NoCandidates => Some(Step::Judgement),
            PipelineError::EmptyDocument => None,
        }
    }
}
