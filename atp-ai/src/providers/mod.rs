//! Completion providers
//!
//! Each provider turns a prompt into raw model text over the vendor's HTTP
//! API. Response bodies are decoded into typed structs and the text is pulled
//! out by a pure `extract_text` function per provider, which is what the
//! tests exercise.

pub mod anthropic;
pub mod google;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use google::GoogleProvider;
pub use openai::OpenAiProvider;

use crate::error::AiError;
use async_trait::async_trait;
use atp_common::config::{resolve_api_key, AiToml};
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const USER_AGENT: &str = concat!("atp/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Source of model completions
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Send `prompt` and return the model's text
    async fn complete(&self, prompt: &str) -> Result<String, AiError>;
}

/// Supported providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Google,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Google => "google",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    /// Environment variable carrying this provider's API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Google => "GOOGLE_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Google => "Google",
            ProviderKind::Anthropic => "Anthropic",
        }
    }

    fn toml_key<'a>(&self, ai: &'a AiToml) -> Option<&'a str> {
        match self {
            ProviderKind::OpenAi => ai.openai_api_key.as_deref(),
            ProviderKind::Google => ai.google_api_key.as_deref(),
            ProviderKind::Anthropic => ai.anthropic_api_key.as_deref(),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "google" => Ok(ProviderKind::Google),
            "anthropic" => Ok(ProviderKind::Anthropic),
            _ => Err(AiError::UnknownProvider(s.to_string())),
        }
    }
}

/// Construct the provider for `kind`, resolving its API key from ENV then TOML
pub fn build_provider(
    kind: ProviderKind,
    ai: &AiToml,
) -> Result<Box<dyn CompletionProvider>, AiError> {
    let api_key = resolve_api_key(kind.api_key_env(), kind.toml_key(ai)).ok_or_else(|| {
        AiError::MissingApiKey(format!(
            "{} API key not found in environment variables ({})",
            kind.display_name(),
            kind.api_key_env()
        ))
    })?;

    let provider: Box<dyn CompletionProvider> = match kind {
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(api_key)?),
        ProviderKind::Google => Box::new(GoogleProvider::new(api_key)?),
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(api_key)?),
    };
    Ok(provider)
}

fn http_client() -> Result<reqwest::Client, AiError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AiError::Network(e.to_string()))
}

/// Send a prepared request and decode a successful JSON body
async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, AiError> {
    let response = request
        .send()
        .await
        .map_err(|e| AiError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(AiError::Api(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| AiError::Parse(e.to_string()))
}
