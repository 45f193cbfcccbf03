//! # Reply Parsing
//!
//! Best-effort heuristics that turn free-text model replies into lists.
//! None of this is a grammar: the model is asked for a numbered list and
//! these functions recover what they can.
//!
//! Failure modes:
//! - [`parse_directions`] errors when a non-empty reply yields nothing.
//!   The caller treats that as fatal.
//! - [`parse_criticisms`] never errors. An empty result means the
//!   hypothesis goes to judging without criticisms.
//! - [`find_chosen_title`] returns `None` when the verdict names no
//!   known candidate.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;
use crate::state::Direction;

/// `1. **Title:** description` (number dot optional, separator optional)
static DIRECTION_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(\d+)\.?\s*\*\*(.*?)\*\*\s*[:\-]?\s*(.*)").expect("valid regex")
});

static NUMBER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.?\s+").expect("valid regex"));

static NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.?\s*").expect("valid regex"));

static BULLET_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[\*\-]\s+").expect("valid regex"));

/// `1.`, `1)` or `1:` followed by whitespace
static CRITICISM_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[\.\):]\s+").expect("valid regex"));

static CRITICISM_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[\.\):]\s*").expect("valid regex"));

/// Fallback criticism lines must be longer than this (in characters)
const MIN_FALLBACK_CRITICISM_CHARS: usize = 10;

// ============================================================================
// Directions
// ============================================================================

/// Parse the direction finder's reply into ordered directions.
///
/// The bold-title pattern is tried first. The looser line-based pass runs
/// only when the bold-title pattern matched nothing at all.
pub fn parse_directions(text: &str) -> Result<Vec<Direction>, ParseError> {
    if text.is_empty() {
        return Err(ParseError::Empty("directions"));
    }

    let mut directions = parse_bold_directions(text);
    if directions.is_empty() {
        tracing::warn!("direction reply has no bold-title items, falling back to line markers");
        directions = parse_marked_directions(text);
    }

    if directions.is_empty() {
        return Err(ParseError::NoItems {
            what: "directions",
            raw: text.to_string(),
        });
    }
    Ok(directions)
}

fn parse_bold_directions(text: &str) -> Vec<Direction> {
    let matches: Vec<_> = DIRECTION_HEADING.captures_iter(text).collect();

    matches
        .iter()
        .enumerate()
        .map(|(i, caps)| {
            let end = caps.get(0).map_or(0, |m| m.end());
            let next_start = matches
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |m| m.start());

            let title = caps.get(2).map_or("", |m| m.as_str()).trim();
            let first_line = caps.get(3).map_or("", |m| m.as_str()).trim();
            let continuation = text[end..next_start].trim();
            let description = format!("{}\n{}", first_line, continuation);

            Direction::new(title, description.trim())
        })
        .collect()
}

fn parse_marked_directions(text: &str) -> Vec<Direction> {
    let mut directions = Vec::new();
    let mut current: Option<Direction> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if NUMBER_MARKER.is_match(line) || BULLET_MARKER.is_match(line) {
            if let Some(done) = current.take() {
                directions.push(split_colon_title(done));
            }
            let title = NUMBER_PREFIX.replace(line, "");
            let title = BULLET_MARKER.replace(title.trim(), "");
            current = Some(Direction::new(title.trim(), ""));
        } else if let Some(direction) = current.as_mut() {
            if !direction.description.is_empty() {
                direction.description.push(' ');
            }
            direction.description.push_str(line);
        }
    }
    if let Some(done) = current {
        directions.push(split_colon_title(done));
    }

    directions
        .into_iter()
        .enumerate()
        .map(|(i, mut d)| {
            if d.title.is_empty() {
                d.title = format!("Direction {}", i + 1);
            }
            if d.description.is_empty() {
                d.description = format!("Further research based on '{}'.", d.title);
            }
            d.title = d.title.trim_matches('*').trim().to_string();
            d
        })
        .collect()
}

/// `Title: description` on a single marker line
fn split_colon_title(mut direction: Direction) -> Direction {
    if direction.description.is_empty() {
        if let Some((left, right)) = direction.title.split_once(':') {
            let title = left
                .trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || ".*- ".contains(c))
                .trim_matches('*')
                .to_string();
            direction.description = right.trim().to_string();
            direction.title = title;
        }
    }
    direction
}

// ============================================================================
// Criticisms
// ============================================================================

/// Parse the critic's reply into individual criticisms.
///
/// Numbered items win. Only when no numbered item is found does every
/// sufficiently long line become its own criticism.
pub fn parse_criticisms(text: &str) -> Vec<String> {
    let mut criticisms = Vec::new();
    let mut current = String::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if CRITICISM_MARKER.is_match(line) {
            if !current.is_empty() {
                criticisms.push(current.trim().to_string());
            }
            current = CRITICISM_PREFIX.replace(line, "").trim().to_string();
        } else if !current.is_empty() {
            current.push(' ');
            current.push_str(line);
        }
    }
    if !current.is_empty() {
        criticisms.push(current.trim().to_string());
    }

    if criticisms.is_empty() && !text.is_empty() {
        tracing::warn!("critic reply has no numbered items, splitting by line");
        criticisms = text
            .lines()
            .filter(|l| !l.trim().is_empty() && l.chars().count() > MIN_FALLBACK_CRITICISM_CHARS)
            .map(|l| l.trim().to_string())
            .collect();
    }
    criticisms
}

// ============================================================================
// Judgement
// ============================================================================

/// Find which candidate the judge picked.
///
/// Looks at the line carrying "Chosen Hypothesis" (and the next non-empty
/// line, for verdicts that put the title underneath) and returns the
/// longest candidate title it mentions, compared case-insensitively.
/// Trailing `:`, `-` and `*` left on a title by the bold-heading parse are
/// ignored when matching; the title is returned as given.
pub fn find_chosen_title(judgement: &str, titles: &[&str]) -> Option<String> {
    let lines: Vec<&str> = judgement.lines().collect();
    let idx = lines
        .iter()
        .position(|l| l.to_lowercase().contains("chosen hypothesis"))?;

    let mut window = lines[idx].to_lowercase();
    if let Some(next) = lines[idx + 1..].iter().find(|l| !l.trim().is_empty()) {
        window.push('\n');
        window.push_str(&next.to_lowercase());
    }

    titles
        .iter()
        .map(|t| (*t, title_key(t)))
        .filter(|(_, key)| !key.is_empty() && window.contains(key.as_str()))
        .max_by_key(|(_, key)| key.chars().count())
        .map(|(t, _)| t.to_string())
}

/// Lowercased title without the separator punctuation around it
fn title_key(title: &str) -> String {
    title
        .trim()
        .trim_end_matches(|c: char| c == ':' || c == '-' || c == '*' || c.is_whitespace())
        .to_lowercase()
}
