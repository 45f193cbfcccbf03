//! Default prompt templates bundled at compile time.
//!
//! Templates may carry `{{key}}` placeholders that are filled in with
//! [`render`] before the call is made.

/// Evaluator - critiques the paper from one skepticism stance
pub const EVALUATOR: &str = include_str!("defaults/evaluator.md");

/// Aggregator - synthesizes the three stance evaluations
pub const AGGREGATOR: &str = include_str!("defaults/aggregator.md");

/// Direction Finder - proposes 3-5 future research directions
pub const DIRECTION_FINDER: &str = include_str!("defaults/direction_finder.md");

/// Maturer - grows one direction into a structured abstract
pub const MATURER: &str = include_str!("defaults/maturer.md");

/// Critic - lists specific criticisms of a matured abstract
pub const CRITIC: &str = include_str!("defaults/critic.md");

/// Debater arguing for a criticism
pub const DEBATE_SUPPORT: &str = include_str!("defaults/debate_support.md");

/// Debater arguing against a criticism
pub const DEBATE_REFUTE: &str = include_str!("defaults/debate_refute.md");

/// Debate Summarizer - neutral summary of one transcript
pub const DEBATE_SUMMARIZER: &str = include_str!("defaults/debate_summarizer.md");

/// Judge - picks the single best hypothesis
pub const JUDGE: &str = include_str!("defaults/judge.md");

/// All default prompts with their slugs
pub fn all_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("evaluator", EVALUATOR),
        ("aggregator", AGGREGATOR),
        ("direction_finder", DIRECTION_FINDER),
        ("maturer", MATURER),
        ("critic", CRITIC),
        ("debate_support", DEBATE_SUPPORT),
        ("debate_refute", DEBATE_REFUTE),
        ("debate_summarizer", DEBATE_SUMMARIZER),
        ("judge", JUDGE),
    ]
}

/// Substitute `{{key}}` placeholders. Unknown placeholders are left as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{{{}}}}}", key), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_prompts_non_empty() {
        for (slug, content) in all_defaults() {
            assert!(!content.is_empty(), "Prompt '{}' should not be empty", slug);
            assert!(content.len() > 50, "Prompt '{}' seems too short", slug);
        }
    }

    #[test]
    fn test_prompt_count() {
        assert_eq!(all_defaults().len(), 9, "Should have 9 default prompts");
    }

    #[test]
    fn test_render_fills_placeholders() {
        let out = render(MATURER, &[("title", "Mechanism X"), ("description", "Probe Y")]);
        assert!(out.contains("* **Title:** Mechanism X"));
        assert!(out.contains("* **Description:** Probe Y"));
        assert!(!out.contains("{{"));
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        assert_eq!(render("a {{b}} {{c}}", &[("b", "x")]), "a x {{c}}");
    }

    #[test]
    fn test_only_templated_prompts_have_placeholders() {
        for (slug, content) in all_defaults() {
            let templated = matches!(slug, "evaluator" | "maturer");
            assert_eq!(content.contains("{{"), templated, "prompt '{}'", slug);
        }
    }
}
