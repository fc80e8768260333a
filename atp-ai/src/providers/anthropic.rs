//! Anthropic Messages API client

use super::{http_client, send_json, CompletionProvider};
use crate::error::AiError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MODEL: &str = "claude-3-opus-20240229";
const MAX_TOKENS: u32 = 4000;

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
}

pub struct AnthropicProvider {
    http_client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Result<Self, AiError> {
        Self::with_endpoint(api_key, ANTHROPIC_MESSAGES_URL)
    }

    pub fn with_endpoint(api_key: String, endpoint: &str) -> Result<Self, AiError> {
        Ok(Self {
            http_client: http_client()?,
            api_key,
            endpoint: endpoint.to_string(),
        })
    }

    /// Text of the first `text` content block
    pub fn extract_text(response: &MessagesResponse) -> Result<String, AiError> {
        response
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.clone())
            .find(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                AiError::EmptyResponse(format!(
                    "No text in Anthropic response (stop_reason={})",
                    response.stop_reason.as_deref().unwrap_or("unknown")
                ))
            })
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let body = json!({
            "model": ANTHROPIC_MODEL,
            "max_tokens": MAX_TOKENS,
            "messages": [{"role": "user", "content": prompt}],
        });

        debug!(model = ANTHROPIC_MODEL, "Requesting Anthropic message");

        let response: MessagesResponse = send_json(
            self.http_client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body),
        )
        .await?;

        Self::extract_text(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: serde_json::Value) -> MessagesResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_extract_first_text_block() {
        let response = parse(json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "Here you go: {\"day_1\": {}}"}
            ],
            "stop_reason": "end_turn"
        }));
        assert_eq!(
            AnthropicProvider::extract_text(&response).unwrap(),
            "Here you go: {\"day_1\": {}}"
        );
    }

    #[test]
    fn test_no_text_block_reports_stop_reason() {
        let response = parse(json!({"content": [], "stop_reason": "max_tokens"}));
        match AnthropicProvider::extract_text(&response) {
            Err(AiError::EmptyResponse(msg)) => assert!(msg.contains("max_tokens")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_client_creation() {
        let provider = AnthropicProvider::new("a-key".to_string()).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }
}
