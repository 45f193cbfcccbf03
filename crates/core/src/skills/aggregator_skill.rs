//! # Aggregator Skill
//!
//! Synthesizes the three stance evaluations into one objective summary.

use crate::error::{PipelineError, Step};
use crate::gateway::Gateway;
use crate::skills::llm_helpers::ask;
use crate::skills::prompts::AGGREGATOR;
use crate::state::Evaluations;

pub struct AggregatorSkill;

impl AggregatorSkill {
    /// User message embedding every critique verbatim, labelled by stance
    pub fn prompt(evaluations: &Evaluations) -> String {
        let mut prompt = String::from("Here are the three critical evaluations:\n\n");
        for (stance, critique) in evaluations.iter() {
            prompt.push_str(&format!(
                "**Evaluation ({} Skepticism):**\n```text\n{}\n```\n\n---\n\n",
                stance, critique
            ));
        }
        prompt.push_str(
            "Based *only* on these evaluations, synthesize an objective summary of the critical perspectives presented.",
        );
        prompt
    }

    #[tracing::instrument(skip_all)]
    pub async fn run(
        evaluations: &Evaluations,
        gateway: &dyn Gateway,
        max_tokens: u32,
    ) -> Result<String, PipelineError> {
        let synthesis = ask(
            gateway,
            "aggregator",
            AGGREGATOR,
            &Self::prompt(evaluations),
            max_tokens,
        )
        .await
        .map_err(|e| PipelineError::gateway(Step::Aggregation, e))?;
        tracing::info!(chars = synthesis.len(), "synthesis done");
        Ok(synthesis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::ScriptedGateway;
    use crate::gateway::GatewayError;

    fn evaluations() -> Evaluations {
        Evaluations {
            low: "Strong results.".into(),
            neutral: "Mixed evidence.".into(),
            high: "Fatal confound.".into(),
        }
    }

    #[tokio::test]
    async fn test_embeds_all_critiques_labelled() {
        let gw = ScriptedGateway::constant("synthesis");
        let out = AggregatorSkill::run(&evaluations(), &gw, 2000).await.unwrap();
        assert_eq!(out, "synthesis");

        let call = &gw.calls()[0];
        assert_eq!(call.max_tokens, 2000);
        assert!(call
            .user
            .contains("**Evaluation (Low Skepticism):**\n```text\nStrong results.\n```"));
        assert!(call.user.contains("**Evaluation (Neutral Skepticism):**"));
        assert!(call
            .user
            .contains("**Evaluation (High Skepticism):**\n```text\nFatal confound.\n```"));
        let low = call.user.find("Low Skepticism").unwrap();
        let high = call.user.find("High Skepticism").unwrap();
        assert!(low < high);
    }

    #[tokio::test]
    async fn test_failure_is_fatal() {
        let gw = ScriptedGateway::failing(GatewayError::BadRequest("too long".into()));
        let err = AggregatorSkill::run(&evaluations(), &gw, 2000)
            .await
            .unwrap_err();
        assert_eq!(err.step(), Some(Step::Aggregation));
    }
}
