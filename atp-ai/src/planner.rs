//! Trip plan generation

use crate::error::AiError;
use crate::parser::{error_plan, parse_ai_response, AiResponse, Plan};
use crate::prompt::build_prompt;
use crate::providers::{build_provider, CompletionProvider, ProviderKind};
use atp_common::config::AiToml;
use atp_common::db::TripDetails;
use serde_json::Value;
use tracing::{debug, error, info};

/// Key marking a plan produced by a failed generation
pub const ERROR_KEY: &str = "error";

/// Generates itineraries through a completion provider
pub struct TripPlanner {
    provider: Box<dyn CompletionProvider>,
}

impl TripPlanner {
    pub fn new(provider: Box<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Planner for a provider named in config (`openai`, `google`, `anthropic`)
    ///
    /// Fails when the name is unknown or the provider has no API key.
    pub fn from_config(provider: &str, ai: &AiToml) -> Result<Self, AiError> {
        let kind: ProviderKind = provider.parse()?;
        Ok(Self::new(build_provider(kind, ai)?))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Ask the provider for an itinerary
    ///
    /// Always returns a plan. Provider failures produce the generation
    /// fallback, which carries an [`ERROR_KEY`] entry; callers check
    /// [`plan_error`] before persisting.
    pub async fn generate_trip_plan(&self, trip: &TripDetails) -> Plan {
        let prompt = build_prompt(trip);
        info!(
            provider = self.provider.name(),
            destination = %trip.destination,
            days = trip.number_of_days(),
            "Generating trip plan"
        );
        debug!(prompt_len = prompt.len(), "Prompt built");

        match self.provider.complete(&prompt).await {
            Ok(text) => {
                debug!(response_len = text.len(), "Provider responded");
                parse_ai_response(AiResponse::RawText(text))
            }
            Err(e) => {
                error!(provider = self.provider.name(), error = %e, "Trip plan generation failed");
                generation_fallback(&e.to_string())
            }
        }
    }
}

/// Static plan returned when the provider call fails
pub fn generation_fallback(message: &str) -> Plan {
    let mut plan = error_plan(
        "Error occurred while generating trip plan",
        &["Please try again later", "Contact support if the issue persists"],
        "Error generating recommendations",
        message,
    );
    plan.insert(ERROR_KEY.to_string(), Value::String(message.to_string()));
    plan
}

/// The failure message of a plan from a failed generation
pub fn plan_error(plan: &Plan) -> Option<&str> {
    plan.get(ERROR_KEY).and_then(Value::as_str)
}
