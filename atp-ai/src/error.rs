//! AI provider error types

use thiserror::Error;

/// Errors raised while talking to a completion provider
#[derive(Debug, Error)]
pub enum AiError {
    /// No key configured for the selected provider
    #[error("{0}")]
    MissingApiKey(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Provider answered but produced no text
    #[error("{0}")]
    EmptyResponse(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}
