//! # Debate Summary Skill
//!
//! Neutral summary of one criticism's finished debate.

use crate::gateway::Gateway;
use crate::skills::llm_helpers::ask;
use crate::skills::prompts::DEBATE_SUMMARIZER;
use crate::state::{SummaryOutcome, Transcript};

pub struct DebateSummarySkill;

impl DebateSummarySkill {
    pub fn prompt(transcript: &Transcript) -> String {
        format!(
            "**Criticism Debated:**\n```text\n{}\n```\n\n**Full Debate Transcript:**\n```text\n{}\n```\n\n---\n\
             Please provide a concise, neutral summary of this debate.",
            transcript.criticism,
            transcript.render()
        )
    }

    pub async fn run(
        transcript: &Transcript,
        gateway: &dyn Gateway,
        max_tokens: u32,
    ) -> SummaryOutcome {
        match ask(
            gateway,
            "debate_summarizer",
            DEBATE_SUMMARIZER,
            &Self::prompt(transcript),
            max_tokens,
        )
        .await
        {
            Ok(text) => SummaryOutcome::Summarized { text },
            Err(e) => SummaryOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}
