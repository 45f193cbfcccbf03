//! # Evaluator Skill
//!
//! Critiques the document three times, once per skepticism stance.

use crate::error::{PipelineError, Step};
use crate::gateway::{Gateway, GatewayError};
use crate::skills::llm_helpers::{ask, truncate_document};
use crate::skills::prompts::{render, EVALUATOR};
use crate::state::{Evaluation, Evaluations, Stance};

pub struct EvaluatorSkill;

impl EvaluatorSkill {
    /// Stance-specific system instruction
    pub fn instruction(stance: Stance) -> String {
        render(
            EVALUATOR,
            &[
                ("stance", stance.label()),
                ("stance_description", stance.description()),
            ],
        )
    }

    /// Evaluate the document under one stance.
    pub async fn run(
        document: &str,
        stance: Stance,
        gateway: &dyn Gateway,
        max_tokens: u32,
        max_document_chars: usize,
    ) -> Result<Evaluation, GatewayError> {
        let prompt = format!(
            "Here is the paper text to evaluate:\n\n```text\n{}\n```",
            truncate_document(document, max_document_chars)
        );
        let critique = ask(
            gateway,
            "evaluator",
            &Self::instruction(stance),
            &prompt,
            max_tokens,
        )
        .await?;
        Ok(Evaluation { stance, critique })
    }

    /// Evaluate under Low, Neutral and High in that order.
    ///
    /// The first failure aborts; later stances are not attempted.
    #[tracing::instrument(skip_all, fields(document_chars = document.len()))]
    pub async fn run_all(
        document: &str,
        gateway: &dyn Gateway,
        max_tokens: u32,
        max_document_chars: usize,
    ) -> Result<Evaluations, PipelineError> {
        let mut evaluations = Evaluations::default();
        for stance in Stance::ALL {
            let evaluation = Self::run(document, stance, gateway, max_tokens, max_document_chars)
                .await
                .map_err(|e| PipelineError::gateway(Step::Evaluation(stance), e))?;
            tracing::info!(stance = %stance, chars = evaluation.critique.len(), "evaluation done");
            *evaluations.get_mut(stance) = evaluation.critique;
        }
        Ok(evaluations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::ScriptedGateway;

    #[tokio::test]
    async fn test_one_call_per_stance_in_order() {
        let gw = ScriptedGateway::new(|call| {
            let stance = ["Low", "Neutral", "High"]
                .into_iter()
                .find(|s| call.system.contains(&format!("**{}**", s)))
                .unwrap_or("?");
            Ok(format!("{} critique", stance))
        });

        let evals = EvaluatorSkill::run_all("paper", &gw, 3000, 15000).await.unwrap();
        assert_eq!(evals.low, "Low critique");
        assert_eq!(evals.neutral, "Neutral critique");
        assert_eq!(evals.high, "High critique");

        let calls = gw.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].system.contains(Stance::Low.description()));
        assert!(calls[2].system.contains(Stance::High.description()));
        assert!(calls.iter().all(|c| c.max_tokens == 3000));
        assert!(calls.iter().all(|c| c.user.contains("```text\npaper\n```")));
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_stances() {
        let gw = ScriptedGateway::new(|call| {
            if call.system.contains("**Neutral**") {
                Err(GatewayError::Connection("refused".into()))
            } else {
                Ok("fine".into())
            }
        });

        let err = EvaluatorSkill::run_all("paper", &gw, 3000, 15000)
            .await
            .unwrap_err();
        assert_eq!(err.step(), Some(Step::Evaluation(Stance::Neutral)));
        assert_eq!(gw.call_count(), 2);
    }

    #[tokio::test]
    async fn test_document_capped_in_prompt() {
        let gw = ScriptedGateway::constant("ok");
        let doc = "y".repeat(50);
        EvaluatorSkill::run(&doc, Stance::Low, &gw, 10, 20)
            .await
            .unwrap();
        let user = &gw.calls()[0].user;
        assert!(user.contains(&format!("{}\n... (paper text truncated)", "y".repeat(20))));
        assert!(!user.contains(&"y".repeat(21)));
    }
}
