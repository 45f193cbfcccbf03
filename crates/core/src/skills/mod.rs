//! # PaperLab Skills
//!
//! One skill per agent in the analysis pipeline. Each skill is a prompt
//! template plus light parsing of the model's free-text reply, called
//! through the shared [`Gateway`](crate::gateway::Gateway).
//!
//! ## Skill Categories
//!
//! **Paper Critique** (fatal on failure):
//! - `EvaluatorSkill` - Critique under Low / Neutral / High skepticism
//! - `AggregatorSkill` - Synthesize the three critiques
//! - `DirectionSkill` - Propose research directions
//!
//! **Hypothesis Development** (failures recorded inline):
//! - `MaturerSkill` - Grow a direction into a study abstract
//! - `CriticSkill` - List criticisms of an abstract
//! - `DebateSkill` - Argue each criticism for and against
//! - `DebateSummarySkill` - Summarize a finished debate
//!
//! **Verdict:**
//! - `JudgeSkill` - Pick the single best hypothesis

pub mod llm_helpers;
pub mod parsing;
pub mod prompts;

// Paper Critique
pub mod aggregator_skill;
pub mod direction_skill;
pub mod evaluator_skill;

// Hypothesis Development
pub mod critic_skill;
pub mod debate_skill;
pub mod debate_summary_skill;
pub mod maturer_skill;

// Verdict
pub mod judge_skill;

// Re-exports for convenience
pub use aggregator_skill::AggregatorSkill;
pub use critic_skill::CriticSkill;
pub use debate_skill::DebateSkill;
pub use debate_summary_skill::DebateSummarySkill;
pub use direction_skill::DirectionSkill;
pub use evaluator_skill::EvaluatorSkill;
pub use judge_skill::JudgeSkill;
pub use maturer_skill::MaturerSkill;
