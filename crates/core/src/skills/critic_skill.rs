//! # Critic Skill
//!
//! Reviews a matured hypothesis abstract and lists specific criticisms.
//! Produces an empty list when the call fails or nothing parses; the
//! hypothesis still goes on to judging.

use crate::gateway::Gateway;
use crate::skills::llm_helpers::ask;
use crate::skills::parsing::parse_criticisms;
use crate::skills::prompts::CRITIC;

pub struct CriticSkill;

impl CriticSkill {
    pub fn prompt(title: &str, abstract_text: &str) -> String {
        format!(
            "**Hypothesis Title:** {}\n\n**Hypothesis Abstract to Critique:**\n```text\n{}\n```\n\n---\n\n\
             Generate 5-10 specific criticisms of this proposed research, formatted as a numbered list.",
            title, abstract_text
        )
    }

    #[tracing::instrument(skip_all, fields(hypothesis = %title))]
    pub async fn run(
        title: &str,
        abstract_text: &str,
        gateway: &dyn Gateway,
        max_tokens: u32,
    ) -> Vec<String> {
        let reply = match ask(
            gateway,
            "critic",
            CRITIC,
            &Self::prompt(title, abstract_text),
            max_tokens,
        )
        .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "critic call failed, continuing without criticisms");
                return Vec::new();
            }
        };

        let criticisms = parse_criticisms(&reply);
        if criticisms.is_empty() {
            tracing::warn!(raw = %reply, "no parseable criticisms");
        } else {
            tracing::info!(count = criticisms.len(), "criticisms generated");
        }
        criticisms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::ScriptedGateway;
    use crate::gateway::GatewayError;

    #[tokio::test]
    async fn test_numbered_reply_becomes_criticisms() {
        let gw = ScriptedGateway::constant("1. Sample too small\n2. No controls\n3. Vague measures");
        let out = CriticSkill::run("Mechanism X", "abstract", &gw, 1500).await;
        assert_eq!(out, vec!["Sample too small", "No controls", "Vague measures"]);

        let call = &gw.calls()[0];
        assert_eq!(call.system, CRITIC);
        assert_eq!(call.max_tokens, 1500);
        assert!(call.user.starts_with("**Hypothesis Title:** Mechanism X"));
        assert!(call.user.contains("```text\nabstract\n```"));
    }

    #[tokio::test]
    async fn test_failure_yields_no_criticisms() {
        let gw = ScriptedGateway::failing(GatewayError::RateLimited("429".into()));
        assert!(CriticSkill::run("T", "A", &gw, 1500).await.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_reply_yields_no_criticisms() {
        let gw = ScriptedGateway::constant("fine");
        assert!(CriticSkill::run("T", "A", &gw, 1500).await.is_empty());
    }
}
