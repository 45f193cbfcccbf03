//! # Debate Skill
//!
//! Runs a fixed number of rounds over one criticism. Each round asks one
//! agent to argue for the criticism and then another to argue against
//! it, and every call sees the transcript accumulated so far.
//!
//! ```text
//! Round(1, Support) → Round(1, Refute) → Round(2, Support) → … → Round(n, Refute)
//! ```
//!
//! Order is enforced by awaiting each call before building the next
//! prompt. A failed call leaves a placeholder in the transcript and the
//! debate carries on.

use crate::gateway::Gateway;
use crate::skills::llm_helpers::{ask, excerpt};
use crate::skills::prompts::{DEBATE_REFUTE, DEBATE_SUPPORT};
use crate::state::{DebateTurn, Side, Transcript};
use crate::swarm::events::{EventSink, PipelineEvent, PipelineEventKind};

/// Every `(round, side)` of a debate, in the order they are argued
pub fn turn_order(rounds: u32) -> impl Iterator<Item = (u32, Side)> {
    (1..=rounds).flat_map(|round| [(round, Side::Support), (round, Side::Refute)])
}

pub struct DebateSkill;

impl DebateSkill {
    fn instruction(side: Side) -> &'static str {
        match side {
            Side::Support => DEBATE_SUPPORT,
            Side::Refute => DEBATE_REFUTE,
        }
    }

    pub fn prompt(side: Side, criticism: &str, abstract_text: &str, history: &str) -> String {
        let (role, role_instruction) = match side {
            Side::Support => (
                "SUPPORT",
                "Present a strong argument IN SUPPORT of the criticism, considering the debate history.",
            ),
            Side::Refute => (
                "REFUTE",
                "Present a strong argument REFUTING the criticism, responding to the points raised in the debate history.",
            ),
        };
        format!(
            "**Hypothesis Abstract:**\n```text\n{}\n```\n\n\
             **Criticism Being Debated:**\n```text\n{}\n```\n\n\
             **Debate History So Far:**\n```text\n{}\n```\n\n---\n\n\
             **Your Turn ({}):** {} Keep your argument concise (1-2 paragraphs).",
            abstract_text, criticism, history, role, role_instruction
        )
    }

    /// Debate one criticism for `rounds` rounds and return the transcript.
    #[tracing::instrument(skip_all, fields(criticism = %excerpt(criticism, 60), rounds = rounds))]
    pub async fn run(
        criticism: &str,
        abstract_text: &str,
        rounds: u32,
        gateway: &dyn Gateway,
        max_tokens: u32,
        events: &EventSink,
    ) -> Transcript {
        let mut transcript = Transcript::new(criticism);

        for (round, side) in turn_order(rounds) {
            let prompt = Self::prompt(side, criticism, abstract_text, &transcript.render());
            let argument = ask(
                gateway,
                "debater",
                Self::instruction(side),
                &prompt,
                max_tokens,
            )
            .await
            .ok();

            events
                .emit(
                    PipelineEvent::new(PipelineEventKind::DebateTurn, "debater").with_data(
                        serde_json::json!({
                            "criticism": excerpt(criticism, 80),
                            "round": round,
                            "side": side,
                            "failed": argument.is_none(),
                        }),
                    ),
                )
                .await;

            transcript.push(DebateTurn {
                round,
                side,
                argument,
            });
        }
        transcript
    }
}
