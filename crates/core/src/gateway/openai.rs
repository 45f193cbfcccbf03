//! OpenAI-compatible chat completions gateway.
//!
//! Serves OpenAI itself plus OpenRouter, Grok and DeepSeek, which all
//! speak the same wire format under a different base URL.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{non_empty, Gateway, GatewayError};

pub struct OpenAiCompatGateway {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl OpenAiCompatGateway {
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
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            client,
        })
    }
}

#[async_trait]
impl Gateway for OpenAiCompatGateway {
    #[tracing::instrument(skip_all, fields(model = %self.model, max_tokens = max_tokens))]
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, GatewayError> {
        let request_body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ],
            "max_tokens": max_tokens
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
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

pub(crate) fn extract_text(resp: &Value) -> Result<String, GatewayError> {
    resp["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            GatewayError::MalformedResponse(format!("no message content in response: {}", resp))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_message_content() {
        let resp = json!({
            "choices": [{"message": {"role": "assistant", "content": "1. **A** first"}}]
        });
        assert_eq!(extract_text(&resp).unwrap(), "1. **A** first");
    }

    #[test]
    fn test_extract_rejects_null_content() {
        let resp = json!({"choices": [{"message": {"content": null}}]});
        assert_eq!(extract_text(&resp).unwrap_err().kind(), "malformed_response");
        assert!(extract_text(&json!({})).is_err());
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let gw = OpenAiCompatGateway::new(
            "key".into(),
            "gpt-4o",
            "http://localhost:11434/v1".into(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(gw.endpoint, "http://localhost:11434/v1/chat/completions");
    }
}
