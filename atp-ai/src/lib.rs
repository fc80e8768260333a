//! # ATP AI
//!
//! Itinerary generation for the AI Trip Planner:
//! - Prompt construction from trip details
//! - Completion providers (OpenAI, Google Gemini, Anthropic) over HTTP
//! - Tolerant parsing of model output into a plan object
//! - Typed itinerary view for rendering plans

pub mod error;
pub mod itinerary;
pub mod parser;
pub mod planner;
pub mod prompt;
pub mod providers;

pub use error::AiError;
pub use itinerary::Itinerary;
pub use parser::{parse_ai_response, AiResponse};
pub use planner::TripPlanner;
pub use providers::{CompletionProvider, ProviderKind};
