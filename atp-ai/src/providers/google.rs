//! Google Gemini `generateContent` client

use super::{http_client, send_json, CompletionProvider};
use crate::error::AiError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const GEMINI_MODEL: &str = "gemini-2.5-flash";
const MAX_OUTPUT_TOKENS: u32 = 2048;
const TEMPERATURE: f64 = 0.9;

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
pub struct Part {
    pub text: Option<String>,
}

pub struct GoogleProvider {
    http_client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleProvider {
    pub fn new(api_key: String) -> Result<Self, AiError> {
        let endpoint = format!("{}/{}:generateContent", GEMINI_BASE_URL, GEMINI_MODEL);
        Self::with_endpoint(api_key, &endpoint)
    }

    pub fn with_endpoint(api_key: String, endpoint: &str) -> Result<Self, AiError> {
        Ok(Self {
            http_client: http_client()?,
            api_key,
            endpoint: endpoint.to_string(),
        })
    }

    /// First non-empty text part across candidates
    ///
    /// When there is none, the error lists each candidate's finish reason
    /// (safety blocks and token limits show up there).
    pub fn extract_text(response: &GenerateContentResponse) -> Result<String, AiError> {
        let text = response
            .candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .map(str::trim)
            .find(|text| !text.is_empty());

        if let Some(text) = text {
            return Ok(text.to_string());
        }

        let reasons: Vec<String> = response
            .candidates
            .iter()
            .map(|c| {
                format!(
                    "candidate_finish_reason={}",
                    c.finish_reason.as_deref().unwrap_or("None")
                )
            })
            .collect();

        warn!(candidates = response.candidates.len(), "Gemini returned no text");
        Err(AiError::EmptyResponse(format!(
            "No response generated from Google AI. {}",
            reasons.join("; ")
        )))
    }
}

#[async_trait]
impl CompletionProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
                "temperature": TEMPERATURE,
            },
        });

        debug!(model = GEMINI_MODEL, "Requesting Gemini content generation");

        let response: GenerateContentResponse = send_json(
            self.http_client
                .post(&self.endpoint)
                .header("x-goog-api-key", &self.api_key)
                .json(&body),
        )
        .await?;

        Self::extract_text(&response)
    }
}
