//! # Judge Skill
//!
//! Weighs every matured hypothesis (abstract, criticisms and debate
//! summaries) and picks one. Hypotheses whose abstract failed are left
//! out of the digest.

use crate::error::{PipelineError, Step};
use crate::gateway::Gateway;
use crate::skills::llm_helpers::{ask, excerpt};
use crate::skills::parsing::find_chosen_title;
use crate::skills::prompts::JUDGE;
use crate::state::{Hypothesis, Judgement};

const ABSTRACT_EXCERPT_CHARS: usize = 1000;
const CRITICISM_EXCERPT_CHARS: usize = 200;
const SUMMARY_EXCERPT_CHARS: usize = 300;

pub struct JudgeSkill;

impl JudgeSkill {
    /// Hypotheses eligible for judging, in input order
    pub fn candidates(hypotheses: &[Hypothesis]) -> Vec<&Hypothesis> {
        hypotheses.iter().filter(|h| h.is_matured()).collect()
    }

    /// Condensed view of the candidates handed to the judge
    pub fn digest(candidates: &[&Hypothesis]) -> String {
        let mut out = String::from("Here is the data for the hypotheses you need to judge:\n\n");
        for (i, hypothesis) in candidates.iter().enumerate() {
            out.push_str(&format!("--- Hypothesis {} ---\n", i + 1));
            out.push_str(&format!("**Title:** {}\n", hypothesis.title()));
            out.push_str(&format!(
                "**Abstract Excerpt:**\n{}\n\n",
                excerpt(hypothesis.abstract_outcome.as_text(), ABSTRACT_EXCERPT_CHARS)
            ));
            out.push_str("**Criticism & Debate Summaries:**\n");
            if hypothesis.criticisms.is_empty() {
                out.push_str("  * No criticisms were generated or debated for this hypothesis.\n");
            }
            for (j, criticism) in hypothesis.criticisms.iter().enumerate() {
                out.push_str(&format!(
                    "  * **Criticism {}:** {}\n",
                    j + 1,
                    excerpt(&criticism.text, CRITICISM_EXCERPT_CHARS)
                ));
                out.push_str(&format!(
                    "    * **Debate Summary:** {}\n",
                    excerpt(criticism.summary.as_text(), SUMMARY_EXCERPT_CHARS)
                ));
            }
            out.push_str("---\n\n");
        }
        out.push_str(
            "\nPlease evaluate these hypotheses based on the criteria provided in the system prompt (Novelty, Validity Post-Debate, Significance, Feasibility) and provide your final judgement in the specified output format.",
        );
        out
    }

    /// Judge the matured hypotheses. No candidates, or a failed call,
    /// aborts the run.
    #[tracing::instrument(skip_all, fields(hypotheses = hypotheses.len()))]
    pub async fn run(
        hypotheses: &[Hypothesis],
        gateway: &dyn Gateway,
        max_tokens: u32,
    ) -> Result<Judgement, PipelineError> {
        let candidates = Self::candidates(hypotheses);
        if candidates.is_empty() {
            return Err(PipelineError::NoCandidates);
        }

        let text = ask(gateway, "judge", JUDGE, &Self::digest(&candidates), max_tokens)
            .await
            .map_err(|e| PipelineError::gateway(Step::Judgement, e))?;

        let titles: Vec<&str> = candidates.iter().map(|h| h.title()).collect();
        let chosen_title = find_chosen_title(&text, &titles);
        match &chosen_title {
            Some(title) => tracing::info!(chosen = %title, "judgement done"),
            None => tracing::warn!("judgement names no known candidate title"),
        }
        Ok(Judgement { text, chosen_title })
    }
}
