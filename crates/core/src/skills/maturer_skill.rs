//! # Maturer Skill
//!
//! Grows one research direction into a long, structured study abstract.
//! A failed call is recorded on the hypothesis and never aborts the run.

use crate::gateway::Gateway;
use crate::skills::llm_helpers::{ask, truncate_document};
use crate::skills::prompts::{render, MATURER};
use crate::state::{AbstractOutcome, Direction};

pub struct MaturerSkill;

impl MaturerSkill {
    pub fn instruction(direction: &Direction) -> String {
        render(
            MATURER,
            &[
                ("title", direction.title.as_str()),
                ("description", direction.description.as_str()),
            ],
        )
    }

    pub fn prompt(direction: &Direction, document: &str, max_document_chars: usize) -> String {
        format!(
            "**Original Paper Text (Excerpt for Context):**\n```text\n{}\n```\n\n---\n\n\
             **Research Direction to Mature:**\n* **Title:** {}\n* **Description:** {}\n\n---\n\n\
             Based on this direction and the context, please generate the detailed 500-1000 word abstract following all instructions in the system prompt.",
            truncate_document(document, max_document_chars),
            direction.title,
            direction.description
        )
    }

    #[tracing::instrument(skip_all, fields(direction = %direction.title))]
    pub async fn run(
        direction: &Direction,
        document: &str,
        gateway: &dyn Gateway,
        max_tokens: u32,
        max_document_chars: usize,
    ) -> AbstractOutcome {
        let result = ask(
            gateway,
            "maturer",
            &Self::instruction(direction),
            &Self::prompt(direction, document, max_document_chars),
            max_tokens,
        )
        .await;

        match result {
            Ok(text) => AbstractOutcome::Matured { text },
            Err(e) => {
                tracing::warn!(error = %e, "could not mature direction");
                AbstractOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
