//! Common error types for ATP

use thiserror::Error;

/// Common result type for ATP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across ATP crates
///
/// Only primary-store and caller-facing failures live here. Mirror failures
/// have their own type ([`crate::mirror::MirrorError`]) and never escape a save.
#[derive(Error, Debug)]
pub enum Error {
    /// Primary database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation conflicts with current record state (e.g. trip already posted)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
