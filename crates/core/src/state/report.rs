//! # Analysis Report
//!
//! Records produced by one pipeline run. Each step hands back its own
//! immutable record; the coordinator assembles them into an
//! [`AnalysisReport`] once the judge has spoken.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Abstract placeholder recorded when maturing a direction fails
pub const ABSTRACT_FAILED: &str = "Error: Failed to generate abstract for this direction.";

/// Debate summary placeholder recorded when summarizing fails
pub const SUMMARY_FAILED: &str = "Error: Failed to generate summary.";

/// Transcript line recorded in place of a failed debate argument
pub const ARGUMENT_FAILED: &str = "*Agent failed to generate argument.*";

// ============================================================================
// Evaluations
// ============================================================================

/// Skepticism posture of an evaluator call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    Low,
    Neutral,
    High,
}

impl Stance {
    /// Evaluation order
    pub const ALL: [Stance; 3] = [Stance::Low, Stance::Neutral, Stance::High];

    pub fn label(&self) -> &'static str {
        match self {
            Stance::Low => "Low",
            Stance::Neutral => "Neutral",
            Stance::High => "High",
        }
    }

    /// Posture text embedded in the evaluator instruction
    pub fn description(&self) -> &'static str {
        match self {
            Stance::Low => {
                "You are generally trusting of the paper's findings. Focus on its strengths, \
                 potential positive implications, and contributions, while acknowledging only \
                 minor or obvious limitations."
            }
            Stance::Neutral => {
                "Maintain a balanced and objective perspective. Assess both the strengths and \
                 weaknesses, methodology, evidence, and conclusions impartially. Avoid taking an \
                 overly positive or negative stance."
            }
            Stance::High => {
                "You are highly skeptical and actively seeking flaws. Focus intensely on \
                 inconsistencies, methodological weaknesses, unsupported claims, logical \
                 fallacies, potential biases, and alternative explanations. Challenge assertions \
                 rigorously."
            }
        }
    }
}

impl std::fmt::Display for Stance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One stance's critique of the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub stance: Stance,
    pub critique: String,
}

/// Exactly one evaluation per stance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluations {
    pub low: String,
    pub neutral: String,
    pub high: String,
}

impl Evaluations {
    pub fn get(&self, stance: Stance) -> &str {
        match stance {
            Stance::Low => &self.low,
            Stance::Neutral => &self.neutral,
            Stance::High => &self.high,
        }
    }

    pub fn get_mut(&mut self, stance: Stance) -> &mut String {
        match stance {
            Stance::Low => &mut self.low,
            Stance::Neutral => &mut self.neutral,
            Stance::High => &mut self.high,
        }
    }

    /// Evaluations in stance order
    pub fn iter(&self) -> impl Iterator<Item = (Stance, &str)> {
        Stance::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

// ============================================================================
// Directions & Hypotheses
// ============================================================================

/// Candidate research theme extracted from the direction finder's reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direction {
    pub title: String,
    pub description: String,
}

impl Direction {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Result of maturing a direction into an abstract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AbstractOutcome {
    Matured { text: String },
    Failed { reason: String },
}

impl AbstractOutcome {
    pub fn is_matured(&self) -> bool {
        matches!(self, AbstractOutcome::Matured { .. })
    }

    /// Abstract text, or the error placeholder
    pub fn as_text(&self) -> &str {
        match self {
            AbstractOutcome::Matured { text } => text,
            AbstractOutcome::Failed { .. } => ABSTRACT_FAILED,
        }
    }
}

/// Result of summarizing one debate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryOutcome {
    Summarized { text: String },
    Failed { reason: String },
}

impl SummaryOutcome {
    pub fn as_text(&self) -> &str {
        match self {
            SummaryOutcome::Summarized { text } => text,
            SummaryOutcome::Failed { .. } => SUMMARY_FAILED,
        }
    }
}

/// Which side of the criticism a debate turn argues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Argues the criticism is valid
    Support,
    /// Argues against the criticism
    Refute,
}

impl Side {
    pub fn heading(&self) -> &'static str {
        match self {
            Side::Support => "Argument For",
            Side::Refute => "Argument Against",
        }
    }
}

/// One argument in a debate; `argument` is `None` when the call failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateTurn {
    pub round: u32,
    pub side: Side,
    pub argument: Option<String>,
}

/// Append-only record of one criticism's debate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub criticism: String,
    pub turns: Vec<DebateTurn>,
}

impl Transcript {
    pub fn new(criticism: impl Into<String>) -> Self {
        Self {
            criticism: criticism.into(),
            turns: Vec::new(),
        }
    }

    pub fn push(&mut self, turn: DebateTurn) {
        self.turns.push(turn);
    }

    /// Text form fed back into debate and summary prompts
    pub fn render(&self) -> String {
        let mut out = format!("**Criticism:**\n{}", self.criticism);
        for turn in &self.turns {
            out.push_str(&format!(
                "\n\n**Round {} - {}:**\n{}",
                turn.round,
                turn.side.heading(),
                turn.argument.as_deref().unwrap_or(ARGUMENT_FAILED)
            ));
        }
        out
    }
}

/// A criticism of a matured hypothesis together with its debate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criticism {
    pub text: String,
    pub transcript: Transcript,
    pub summary: SummaryOutcome,
}

/// A direction developed through maturation, criticism and debate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub direction: Direction,
    #[serde(rename = "abstract")]
    pub abstract_outcome: AbstractOutcome,
    pub criticisms: Vec<Criticism>,
}

impl Hypothesis {
    pub fn title(&self) -> &str {
        &self.direction.title
    }

    pub fn is_matured(&self) -> bool {
        self.abstract_outcome.is_matured()
    }
}

/// The judge's verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgement {
    pub text: String,
    /// Candidate title named on the "Chosen Hypothesis" line, if recognizable
    pub chosen_title: Option<String>,
}

// ============================================================================
// Report
// ============================================================================

/// Everything one run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: String,
    pub model: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub evaluations: Evaluations,
    pub synthesis: String,
    pub directions: Vec<Direction>,
    pub hypotheses: Vec<Hypothesis>,
    pub judgement: Judgement,
}

impl AnalysisReport {
    /// Render the report as Markdown, section per pipeline step
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("# Paper Analysis Report\n\n");
        md.push_str(&format!(
            "_Run `{}` · model `{}` · {}_\n\n",
            self.id,
            self.model,
            self.finished_at.format("%Y-%m-%d %H:%M UTC")
        ));

        md.push_str("## Critical Evaluations\n\n");
        for (stance, critique) in self.evaluations.iter() {
            md.push_str(&format!("### {} Skepticism\n\n{}\n\n", stance, critique.trim()));
        }

        md.push_str("## Objective Summary of Critical Perspectives\n\n");
        md.push_str(self.synthesis.trim());
        md.push_str("\n\n## Future Hypothesis Directions\n\n");
        for (i, direction) in self.directions.iter().enumerate() {
            md.push_str(&format!(
                "**{}. {}**\n\n> {}\n\n",
                i + 1,
                direction.title,
                direction.description
            ));
        }

        md.push_str("## Hypothesis Development, Criticism & Debate\n\n");
        for hypothesis in &self.hypotheses {
            md.push_str(&format!("### {}\n\n", hypothesis.title()));
            match &hypothesis.abstract_outcome {
                AbstractOutcome::Matured { text } => {
                    md.push_str(text.trim());
                    md.push_str("\n\n");
                }
                AbstractOutcome::Failed { reason } => {
                    md.push_str(&format!("> {} ({})\n\n", ABSTRACT_FAILED, reason));
                    continue;
                }
            }
            if hypothesis.criticisms.is_empty() {
                md.push_str("_No criticisms were generated or debated for this hypothesis._\n\n");
            }
            for (j, criticism) in hypothesis.criticisms.iter().enumerate() {
                md.push_str(&format!("**Criticism {}:** {}\n\n", j + 1, criticism.text));
                md.push_str("**Debate Summary:**\n\n");
                md.push_str(criticism.summary.as_text().trim());
                md.push_str("\n\n---\n\n");
            }
        }

        md.push_str("## Final Judgement\n\n");
        md.push_str(self.judgement.text.trim());
        md.push('\n');
        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_render_includes_failed_turns() {
        let mut transcript = Transcript::new("Sample too small");
        transcript.push(DebateTurn {
            round: 1,
            side: Side::Support,
            argument: Some("n=12 is underpowered".into()),
        });
        transcript.push(DebateTurn {
            round: 1,
            side: Side::Refute,
            argument: None,
        });

        assert_eq!(
            transcript.render(),
            "**Criticism:**\nSample too small\
             \n\n**Round 1 - Argument For:**\nn=12 is underpowered\
             \n\n**Round 1 - Argument Against:**\n*Agent failed to generate argument.*"
        );
    }

    #[test]
    fn test_outcome_placeholders() {
        let failed = AbstractOutcome::Failed {
            reason: "timeout".into(),
        };
        assert!(!failed.is_matured());
        assert_eq!(failed.as_text(), ABSTRACT_FAILED);

        let summary = SummaryOutcome::Failed {
            reason: "429".into(),
        };
        assert_eq!(summary.as_text(), SUMMARY_FAILED);
    }

    #[test]
    fn test_evaluations_iterate_in_stance_order() {
        let evals = Evaluations {
            low: "l".into(),
            neutral: "n".into(),
            high: "h".into(),
        };
        let order: Vec<_> = evals.iter().map(|(s, t)| (s.label(), t)).collect();
        assert_eq!(order, vec![("Low", "l"), ("Neutral", "n"), ("High", "h")]);
    }

    #[test]
    fn test_hypothesis_serializes_abstract_field() {
        let hypothesis = Hypothesis {
            direction: Direction::new("T", "D"),
            abstract_outcome: AbstractOutcome::Matured { text: "A".into() },
            criticisms: vec![],
        };
        let json = serde_json::to_value(&hypothesis).unwrap();
        assert_eq!(json["abstract"]["status"], "matured");
        assert_eq!(json["abstract"]["text"], "A");
    }
}
