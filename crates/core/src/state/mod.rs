pub mod io;
pub mod report;

pub use io::{RunArchive, RunSummary};
pub use report::{
    AbstractOutcome, AnalysisReport, Criticism, DebateTurn, Direction, Evaluation, Evaluations,
    Hypothesis, Judgement, Side, Stance, SummaryOutcome, Transcript, ABSTRACT_FAILED,
    ARGUMENT_FAILED, SUMMARY_FAILED,
};
