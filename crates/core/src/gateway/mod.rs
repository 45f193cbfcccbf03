//! # Model Gateway
//!
//! The one external call every agent makes: a system instruction and a
//! user message in, generated text (or a typed failure) out.
//!
//! No retries happen at this layer. A failure goes back to the caller,
//! which either aborts the run or records it inline.

mod anthropic;
mod openai;

#[cfg(test)]
pub(crate) mod testing;

pub use anthropic::AnthropicGateway;
pub use openai::OpenAiCompatGateway;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single gateway call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Could not reach the endpoint (DNS, TLS, refused, timed out)
    #[error("failed to connect to model endpoint: {0}")]
    Connection(String),
    /// HTTP 429
    #[error("model endpoint rate limit hit: {0}")]
    RateLimited(String),
    /// HTTP 400 - prompt or parameters rejected
    #[error("model endpoint rejected the request: {0}")]
    BadRequest(String),
    /// Any other non-success status
    #[error("model endpoint returned status {status}: {body}")]
    Api { status: u16, body: String },
    /// Body could not be decoded or carried no text
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
    #[error("unexpected gateway failure: {0}")]
    Unexpected(String),
}

impl GatewayError {
    /// Stable snake_case label, used in events and logs
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Connection(_) => "connection",
            GatewayError::RateLimited(_) => "rate_limited",
            GatewayError::BadRequest(_) => "bad_request",
            GatewayError::Api { .. } => "api_status",
            GatewayError::MalformedResponse(_) => "malformed_response",
            GatewayError::Unexpected(_) => "unexpected",
        }
    }

    /// Map a non-success HTTP status and its body onto the taxonomy
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => GatewayError::RateLimited(body),
            StatusCode::BAD_REQUEST => GatewayError::BadRequest(body),
            other => GatewayError::Api {
                status: other.as_u16(),
                body,
            },
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            GatewayError::Connection(e.to_string())
        } else if e.is_decode() {
            GatewayError::MalformedResponse(e.to_string())
        } else {
            GatewayError::Unexpected(e.to_string())
        }
    }
}

/// A single synchronous request/response text-generation endpoint.
///
/// Implementations are shared across concurrent hypothesis and debate
/// tasks behind an `Arc<dyn Gateway>`.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Generate text for `user` under the `system` instruction, capped at
    /// `max_tokens` output tokens.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, GatewayError>;

    /// Model identifier, recorded in reports
    fn model(&self) -> &str;
}

/// Reject empty generations; every caller treats them as a failed call.
pub(crate) fn non_empty(text: String) -> Result<String, GatewayError> {
    if text.trim().is_empty() {
        Err(GatewayError::MalformedResponse(
            "response contained an empty text block".to_string(),
        ))
    } else {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            GatewayError::from_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into()).kind(),
            "rate_limited"
        );
        assert_eq!(
            GatewayError::from_status(StatusCode::BAD_REQUEST, "bad".into()).kind(),
            "bad_request"
        );
        assert_eq!(
            GatewayError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom".into()),
            GatewayError::Api {
                status: 500,
                body: "boom".into()
            }
        );
    }

    #[test]
    fn test_empty_text_is_malformed() {
        assert!(non_empty("  \n ".to_string()).is_err());
        assert_eq!(non_empty("ok".to_string()).unwrap(), "ok");
    }
}
