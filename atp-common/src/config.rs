//! Configuration loading and resolution
//!
//! Every setting follows the same priority order:
//! 1. Command-line argument (highest priority, where one exists)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The mirror is the exception to "always has a value": when no connection
//! string is found anywhere, mirroring is disabled and the primary store runs
//! alone.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable holding the mirror connection string
pub const ENV_MIRROR_URI: &str = "ATP_MIRROR_URI";
/// Environment variable holding the mirror target database name
pub const ENV_MIRROR_NAME: &str = "ATP_MIRROR_NAME";
/// Environment variable holding the primary database path
pub const ENV_DATABASE: &str = "ATP_DATABASE";
/// Environment variable selecting the AI provider
pub const ENV_AI_PROVIDER: &str = "ATP_AI_PROVIDER";

/// Mirror database name used when only a connection string is configured
pub const DEFAULT_MIRROR_NAME: &str = "Trip_Planner_AI";
/// AI provider used when none is configured
pub const DEFAULT_AI_PROVIDER: &str = "google";

/// Parsed contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub database_path: Option<PathBuf>,
    pub mirror: MirrorToml,
    pub ai: AiToml,
    pub logging: LoggingConfig,
}

/// `[mirror]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MirrorToml {
    pub uri: Option<String>,
    pub database: Option<String>,
}

/// `[ai]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AiToml {
    pub provider: Option<String>,
    pub openai_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

/// `[logging]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing directive (overridden by RUST_LOG)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Resolved mirror connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSettings {
    /// Connection string for the document store
    pub uri: String,
    /// Target database name inside the document store
    pub database: String,
}

/// Load the TOML config file
///
/// An explicit path must exist and parse. Without one, the platform config
/// location is tried and a missing file yields defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Parse TOML config text
pub fn parse_toml_config(content: &str) -> std::result::Result<TomlConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Platform config file location (`<config_dir>/atp/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("atp").join("config.toml"))
}

/// Resolve the primary SQLite database path
pub fn resolve_database_path(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Some(path) = non_empty_env(ENV_DATABASE) {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.database_path {
        return path.clone();
    }

    // Priority 4: OS-dependent default
    get_default_database_path()
}

fn get_default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("atp").join("trip_planner.db"))
        .unwrap_or_else(|| PathBuf::from("./atp_data/trip_planner.db"))
}

/// Resolve mirror settings, or `None` when mirroring is not configured
///
/// The database name only matters once a connection string is present;
/// a name on its own never enables the mirror.
pub fn resolve_mirror_settings(toml_config: &TomlConfig) -> Option<MirrorSettings> {
    let uri = non_empty_env(ENV_MIRROR_URI).or_else(|| {
        toml_config
            .mirror
            .uri
            .clone()
            .filter(|uri| !uri.trim().is_empty())
    });

    let Some(uri) = uri else {
        debug!("Mirror connection string not configured; mirroring disabled");
        return None;
    };

    let database = non_empty_env(ENV_MIRROR_NAME)
        .or_else(|| {
            toml_config
                .mirror
                .database
                .clone()
                .filter(|name| !name.trim().is_empty())
        })
        .unwrap_or_else(|| DEFAULT_MIRROR_NAME.to_string());

    Some(MirrorSettings { uri, database })
}

/// Resolve the AI provider name
pub fn resolve_ai_provider(cli_arg: Option<&str>, toml_config: &TomlConfig) -> String {
    if let Some(provider) = cli_arg {
        return provider.to_string();
    }

    non_empty_env(ENV_AI_PROVIDER)
        .or_else(|| toml_config.ai.provider.clone())
        .unwrap_or_else(|| DEFAULT_AI_PROVIDER.to_string())
}

/// Resolve an API key from ENV, then TOML
///
/// Warns when both sources carry a key, since only the environment value is used.
pub fn resolve_api_key(env_var_name: &str, toml_value: Option<&str>) -> Option<String> {
    let env_key = std::env::var(env_var_name).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_value.filter(|k| is_valid_key(k));

    match (env_key, toml_key) {
        (Some(env_key), Some(_)) => {
            warn!(
                "{} found in environment and TOML config. Using environment (highest priority).",
                env_var_name
            );
            Some(env_key)
        }
        (Some(env_key), None) => Some(env_key),
        (None, Some(toml_key)) => Some(toml_key.to_string()),
        (None, None) => None,
    }
}

/// A key is usable when it has non-whitespace content
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
