//! Model output parsing
//!
//! Models are asked for a JSON object but routinely wrap it in prose or code
//! fences. The parser takes the span from the first `{` to the last `}` and
//! parses that. Anything that does not yield an object becomes the static
//! fallback itinerary, so callers always get a renderable plan.

use crate::error::AiError;
use serde_json::{json, Map, Value};
use tracing::warn;

/// A plan object: `day_N` keys mapping to day entries
pub type Plan = Map<String, Value>;

/// Model output as handed to the parser
#[derive(Debug, Clone, PartialEq)]
pub enum AiResponse {
    /// Free text that should contain a JSON object
    RawText(String),
    /// An already-decoded object (returned unchanged)
    Structured(Plan),
}

impl From<String> for AiResponse {
    fn from(text: String) -> Self {
        AiResponse::RawText(text)
    }
}

impl From<&str> for AiResponse {
    fn from(text: &str) -> Self {
        AiResponse::RawText(text.to_string())
    }
}

impl From<Plan> for AiResponse {
    fn from(plan: Plan) -> Self {
        AiResponse::Structured(plan)
    }
}

/// Turn model output into a plan object
///
/// Never fails: unparseable text yields [`fallback_itinerary`].
pub fn parse_ai_response(response: AiResponse) -> Plan {
    match response {
        AiResponse::Structured(plan) => plan,
        AiResponse::RawText(text) => match extract_object(&text) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(error = %e, length = text.len(), "Unparseable AI response; using fallback itinerary");
                fallback_itinerary(&e.to_string())
            }
        },
    }
}

fn extract_object(text: &str) -> Result<Plan, AiError> {
    let text = text.trim();

    let (start, end) = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => (start, end),
        _ => {
            return Err(AiError::Parse(
                "No JSON object found in response".to_string(),
            ))
        }
    };

    // Both delimiters are ASCII, so the slice bounds are char boundaries
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(plan)) => Ok(plan),
        Ok(_) => Err(AiError::Parse("Response JSON is not an object".to_string())),
        Err(e) => Err(AiError::Parse(e.to_string())),
    }
}

/// Static itinerary returned when model output cannot be parsed
pub fn fallback_itinerary(message: &str) -> Plan {
    error_plan(
        "Error generating itinerary",
        &["Please try again", "Contact support if the issue persists"],
        "Error generating restaurant recommendations",
        message,
    )
}

/// One-day plan whose every slot carries the same error text
pub(crate) fn error_plan(main: &str, alternatives: &[&str], food: &str, message: &str) -> Plan {
    let message = if message.trim().is_empty() {
        "unknown error"
    } else {
        message
    };
    let slot = json!({ "main": main, "alternatives": alternatives });

    let mut plan = Plan::new();
    plan.insert(
        "day_1".to_string(),
        json!({
            "morning": slot,
            "afternoon": slot,
            "evening": slot,
            "food": [food],
            "tips": format!("Error: {}", message),
        }),
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_fallback(plan: &Plan) -> bool {
        plan["day_1"]["morning"]["main"] == json!("Error generating itinerary")
    }

    #[test]
    fn test_structured_input_is_identity() {
        let mut plan = Plan::new();
        plan.insert("day_1".into(), json!({"tips": "bring water"}));
        plan.insert("weird".into(), json!([1, 2, 3]));

        let parsed = parse_ai_response(AiResponse::Structured(plan.clone()));
        assert_eq!(parsed, plan);
    }

    #[test]
    fn test_json_embedded_in_prose() {
        let text = r#"Sure! Here is your plan: {"day_1": {"morning": {"main": "Walk", "alternatives": []}, "food": [], "tips": ""}} Enjoy!"#;
        let parsed = parse_ai_response(text.into());

        assert_eq!(
            Value::Object(parsed),
            json!({"day_1": {"morning": {"main": "Walk", "alternatives": []}, "food": [], "tips": ""}})
        );
    }

    #[test]
    fn test_code_fenced_json() {
        let text = "```json\n{\"day_1\": {\"tips\": \"Carry cash\"}}\n```";
        let parsed = parse_ai_response(text.into());
        assert_eq!(parsed["day_1"]["tips"], json!("Carry cash"));
    }

    #[test]
    fn test_no_braces_yields_fallback() {
        let parsed = parse_ai_response("I cannot help with that.".into());

        assert!(is_fallback(&parsed));
        let tips = parsed["day_1"]["tips"].as_str().unwrap();
        assert!(tips.starts_with("Error: "));
        assert!(tips.len() > "Error: ".len());
        assert_eq!(
            parsed["day_1"]["food"],
            json!(["Error generating restaurant recommendations"])
        );
        assert_eq!(
            parsed["day_1"]["evening"]["alternatives"],
            json!(["Please try again", "Contact support if the issue persists"])
        );
    }

    #[test]
    fn test_reversed_delimiters_yield_fallback() {
        assert!(is_fallback(&parse_ai_response("} nothing here {".into())));
    }

    #[test]
    fn test_empty_text_yields_fallback() {
        assert!(is_fallback(&parse_ai_response("".into())));
        assert!(is_fallback(&parse_ai_response("   \n".into())));
    }

    #[test]
    fn test_malformed_json_is_not_repaired() {
        let parsed = parse_ai_response(r#"{"day_1": {"tips": "unterminated}"#.into());
        assert!(is_fallback(&parsed));
        assert!(parsed["day_1"]["tips"]
            .as_str()
            .unwrap()
            .starts_with("Error: "));
    }

    #[test]
    fn test_first_and_last_brace_span() {
        // Two objects in prose: the span covers both and is not valid JSON
        let parsed = parse_ai_response(r#"{"a": 1} and also {"b": 2}"#.into());
        assert!(is_fallback(&parsed));
    }

    #[test]
    fn test_error_plan_never_has_empty_message() {
        let plan = error_plan("x", &["y"], "z", "  ");
        assert_eq!(plan["day_1"]["tips"], json!("Error: unknown error"));
    }
}
