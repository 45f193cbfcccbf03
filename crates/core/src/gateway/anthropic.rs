//! Anthropic Messages API gateway.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{non_empty, Gateway, GatewayError};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicGateway {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl AnthropicGateway {
    pub fn new(
        api_key: String,
        model: &str,
        base_url: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            model: model.to_string(),
            endpoint: format!("{}/messages", base_url.trim_end_matches('/')),
            client,
        })
    }
}

#[async_trait]
impl Gateway for AnthropicGateway {
    #[tracing::instrument(skip_all, fields(model = %self.model, max_tokens = max_tokens))]
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, GatewayError> {
        let request_body = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "system": system,
            "messages": [{
                "role": "user",
                "content": user
            }]
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status, body));
        }

        let resp_json: Value = response.json().await?;
        extract_text(&resp_json).and_then(non_empty)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Pull the generated text out of a Messages API response.
///
/// The first block is preferred, but any block carrying `text` will do
/// (tool-use or thinking blocks may come first).
pub(crate) fn extract_text(resp: &Value) -> Result<String, GatewayError> {
    let blocks = resp["content"]
        .as_array()
        .filter(|blocks| !blocks.is_empty())
        .ok_or_else(|| {
            GatewayError::MalformedResponse("empty or unexpected content list".to_string())
        })?;

    blocks
        .iter()
        .find_map(|block| block["text"].as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            GatewayError::MalformedResponse(format!("no text block found in response: {}", resp))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_first_text_block() {
        let resp = json!({
            "content": [{"type": "text", "text": "hello"}, {"type": "text", "text": "later"}]
        });
        assert_eq!(extract_text(&resp).unwrap(), "hello");
    }

    #[test]
    fn test_extract_skips_non_text_blocks() {
        let resp = json!({
            "content": [
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": "found it"}
            ]
        });
        assert_eq!(extract_text(&resp).unwrap(), "found it");
    }

    #[test]
    fn test_extract_rejects_missing_content() {
        let err = extract_text(&json!({"content": []})).unwrap_err();
        assert_eq!(err.kind(), "malformed_response");

        let err = extract_text(&json!({"content": [{"type": "tool_use"}]})).unwrap_err();
        assert!(err.to_string().contains("no text block"));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let gw = AnthropicGateway::new(
            "key".into(),
            "claude",
            "https://api.anthropic.com/v1/".into(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(gw.endpoint, "https://api.anthropic.com/v1/messages");
        assert_eq!(gw.model(), "claude");
    }
}
