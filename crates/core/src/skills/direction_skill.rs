//! # Direction Skill
//!
//! Proposes future research directions from the document and the
//! synthesis of its critiques, then parses the numbered reply.

use crate::error::{PipelineError, Step};
use crate::gateway::Gateway;
use crate::skills::llm_helpers::{ask, truncate_document};
use crate::skills::parsing::parse_directions;
use crate::skills::prompts::DIRECTION_FINDER;
use crate::state::Direction;

pub struct DirectionSkill;

impl DirectionSkill {
    pub fn prompt(document: &str, synthesis: &str, max_document_chars: usize) -> String {
        format!(
            "**Original Paper Text (Excerpt):**\n```text\n{}\n```\n\n---\n\n\
             **Objective Summary of Critical Perspectives:**\n```text\n{}\n```\n\n---\n\n\
             Based on the paper excerpt and the summary of critiques, identify 3-5 general directions for future hypotheses using the specified output format.",
            truncate_document(document, max_document_chars),
            synthesis
        )
    }

    /// Ask for directions and parse them. Both a failed call and an
    /// unparseable reply abort the run.
    #[tracing::instrument(skip_all)]
    pub async fn run(
        document: &str,
        synthesis: &str,
        gateway: &dyn Gateway,
        max_tokens: u32,
        max_document_chars: usize,
    ) -> Result<Vec<Direction>, PipelineError> {
        let reply = ask(
            gateway,
            "direction_finder",
            DIRECTION_FINDER,
            &Self::prompt(document, synthesis, max_document_chars),
            max_tokens,
        )
        .await
        .map_err(|e| PipelineError::gateway(Step::DirectionExtraction, e))?;

        let directions = parse_directions(&reply).map_err(|source| {
            tracing::error!(raw = %reply, "could not parse directions");
            PipelineError::Parse {
                step: Step::DirectionExtraction,
                source,
            }
        })?;
        tracing::info!(count = directions.len(), "directions extracted");
        Ok(directions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::gateway::testing::ScriptedGateway;

    #[tokio::test]
    async fn test_parses_numbered_reply() {
        let gw = ScriptedGateway::constant(
            "1. **Mechanism X:** Explore X.\n2. **Population Z:** Test Z.\n3. **Dose Response:** Vary dose.",
        );
        let dirs = DirectionSkill::run("paper", "summary", &gw, 1000, 15000)
            .await
            .unwrap();
        let titles: Vec<_> = dirs.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Mechanism X:", "Population Z:", "Dose Response:"]);

        let call = &gw.calls()[0];
        assert_eq!(call.max_tokens, 1000);
        assert!(call.user.contains("```text\npaper\n```"));
        assert!(call.user.contains("```text\nsummary\n```"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_fatal() {
        let gw = ScriptedGateway::constant("Sorry, no ideas today.");
        let err = DirectionSkill::run("paper", "summary", &gw, 1000, 15000)
            .await
            .unwrap_err();
        match err {
            PipelineError::Parse { step, source } => {
                assert_eq!(step, Step::DirectionExtraction);
                assert!(matches!(source, ParseError::NoItems { .. }));
                assert_eq!(source.raw(), Some("Sorry, no ideas today."));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
