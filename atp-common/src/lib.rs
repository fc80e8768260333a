//! # ATP Common Library
//!
//! Shared code for the AI Trip Planner crates including:
//! - Primary SQLite store (schema, entity models and queries)
//! - Best-effort document mirror of primary writes
//! - Configuration loading
//! - Error types and timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod mirror;
pub mod store;
pub mod time;

pub use error::{Error, Result};
pub use mirror::{Mirror, MirrorOutcome};
pub use store::Store;
