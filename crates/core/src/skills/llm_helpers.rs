//! # LLM Helpers
//!
//! Shared utilities for skills: the one place that calls the gateway,
//! plus the character-based truncation used when embedding long text in
//! prompts.

use std::borrow::Cow;

use crate::gateway::{Gateway, GatewayError};

/// Marker appended to a document cut down to the prompt cap
pub const TRUNCATION_MARKER: &str = "\n... (paper text truncated)";

/// Call the gateway for one agent, logging sizes and outcome.
pub async fn ask(
    gateway: &dyn Gateway,
    agent: &str,
    system: &str,
    user: &str,
    max_tokens: u32,
) -> Result<String, GatewayError> {
    tracing::debug!(
        agent,
        system_chars = system.len(),
        user_chars = user.len(),
        max_tokens,
        "calling model"
    );
    match gateway.complete(system, user, max_tokens).await {
        Ok(text) => {
            tracing::debug!(agent, reply_chars = text.len(), "model replied");
            Ok(text)
        }
        Err(e) => {
            tracing::warn!(agent, kind = e.kind(), error = %e, "model call failed");
            Err(e)
        }
    }
}

/// Cap a document at `max_chars` characters, appending [`TRUNCATION_MARKER`]
/// when anything was cut.
pub fn truncate_document(text: &str, max_chars: usize) -> Cow<'_, str> {
    match char_boundary(text, max_chars) {
        Some(end) => Cow::Owned(format!("{}{}", &text[..end], TRUNCATION_MARKER)),
        None => Cow::Borrowed(text),
    }
}

/// First `max_chars` characters of `text`, with `...` when cut.
pub fn excerpt(text: &str, max_chars: usize) -> Cow<'_, str> {
    match char_boundary(text, max_chars) {
        Some(end) => Cow::Owned(format!("{}...", &text[..end])),
        None => Cow::Borrowed(text),
    }
}

/// Byte offset of the `max_chars`-th character, or `None` if the text is
/// not longer than that.
fn char_boundary(text: &str, max_chars: usize) -> Option<usize> {
    text.char_indices().nth(max_chars).map(|(idx, _)| idx)
}
