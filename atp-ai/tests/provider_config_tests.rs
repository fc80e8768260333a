//! Provider construction from configuration
//!
//! Mutates API key environment variables, so every test is serial.

use atp_ai::{AiError, TripPlanner};
use atp_common::config::AiToml;
use serial_test::serial;

const KEY_VARS: [&str; 3] = ["OPENAI_API_KEY", "GOOGLE_API_KEY", "ANTHROPIC_API_KEY"];

fn clear_keys() {
    for var in KEY_VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_missing_key_is_configuration_error() {
    clear_keys();
    for provider in ["openai", "google", "anthropic"] {
        match TripPlanner::from_config(provider, &AiToml::default()) {
            Err(AiError::MissingApiKey(msg)) => assert!(msg.contains("API key not found")),
            Err(other) => panic!("{}: unexpected error {}", provider, other),
            Ok(_) => panic!("{}: planner built without a key", provider),
        }
    }
}

#[test]
#[serial]
fn test_key_from_environment() {
    clear_keys();
    std::env::set_var("GOOGLE_API_KEY", "env-google-key");

    let planner = TripPlanner::from_config("google", &AiToml::default()).unwrap();
    assert_eq!(planner.provider_name(), "google");
    clear_keys();
}

#[test]
#[serial]
fn test_key_from_toml() {
    clear_keys();
    let ai = AiToml {
        anthropic_api_key: Some("toml-anthropic-key".to_string()),
        ..Default::default()
    };

    let planner = TripPlanner::from_config("anthropic", &ai).unwrap();
    assert_eq!(planner.provider_name(), "anthropic");

    // Key for a different provider does not help
    assert!(matches!(
        TripPlanner::from_config("openai", &ai),
        Err(AiError::MissingApiKey(_))
    ));
}

#[test]
#[serial]
fn test_blank_key_counts_as_missing() {
    clear_keys();
    std::env::set_var("OPENAI_API_KEY", "   ");
    assert!(matches!(
        TripPlanner::from_config("openai", &AiToml::default()),
        Err(AiError::MissingApiKey(_))
    ));
    clear_keys();
}
