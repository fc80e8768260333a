//! OpenAI chat completions client

use super::{http_client, send_json, CompletionProvider};
use crate::error::AiError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_MODEL: &str = "gpt-4";

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChatMessage>,
    /// Legacy completions field
    pub text: Option<String>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub content: Option<String>,
}

pub struct OpenAiProvider {
    http_client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String) -> Result<Self, AiError> {
        Self::with_endpoint(api_key, OPENAI_CHAT_URL)
    }

    /// Client posting to a non-default endpoint (proxies, compatible servers)
    pub fn with_endpoint(api_key: String, endpoint: &str) -> Result<Self, AiError> {
        Ok(Self {
            http_client: http_client()?,
            api_key,
            endpoint: endpoint.to_string(),
        })
    }

    /// Message content of the first choice
    pub fn extract_text(response: &ChatCompletionResponse) -> Result<String, AiError> {
        let choice = response
            .choices
            .first()
            .ok_or_else(|| AiError::EmptyResponse("No choices in OpenAI response".to_string()))?;

        choice
            .message
            .as_ref()
            .and_then(|m| m.content.clone())
            .or_else(|| choice.text.clone())
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                AiError::EmptyResponse(format!(
                    "No content in OpenAI response (finish_reason={})",
                    choice.finish_reason.as_deref().unwrap_or("unknown")
                ))
            })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let body = json!({
            "model": OPENAI_MODEL,
            "messages": [{"role": "user", "content": prompt}],
        });

        debug!(model = OPENAI_MODEL, "Requesting OpenAI chat completion");

        let response: ChatCompletionResponse = send_json(
            self.http_client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body),
        )
        .await?;

        Self::extract_text(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: serde_json::Value) -> ChatCompletionResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_extract_message_content() {
        let response = parse(json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "{\"day_1\": {}}"}, "finish_reason": "stop"}
            ]
        }));
        assert_eq!(
            OpenAiProvider::extract_text(&response).unwrap(),
            "{\"day_1\": {}}"
        );
    }

    #[test]
    fn test_extract_legacy_text_field() {
        let response = parse(json!({"choices": [{"text": "plain completion"}]}));
        assert_eq!(
            OpenAiProvider::extract_text(&response).unwrap(),
            "plain completion"
        );
    }

    #[test]
    fn test_no_choices_is_empty_response() {
        let response = parse(json!({"choices": []}));
        assert!(matches!(
            OpenAiProvider::extract_text(&response),
            Err(AiError::EmptyResponse(_))
        ));
    }

    #[test]
    fn test_null_content_reports_finish_reason() {
        let response = parse(json!({
            "choices": [{"message": {"role": "assistant", "content": null}, "finish_reason": "content_filter"}]
        }));
        match OpenAiProvider::extract_text(&response) {
            Err(AiError::EmptyResponse(msg)) => assert!(msg.contains("content_filter")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_client_creation() {
        let provider = OpenAiProvider::new("sk-test".to_string()).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.endpoint, OPENAI_CHAT_URL);
    }
}
