//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Port for the REST + WebSocket server.
    pub port: u16,
    /// Model name passed to the extraction oracle.
    pub model: String,
    /// Deadline for a single oracle call; a timeout degrades to no-update.
    pub oracle_timeout: Duration,
    /// Token cap for extraction replies (they are a single small JSON object).
    pub extraction_max_tokens: u64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            model: "claude-sonnet-4-20250514".to_string(),
            oracle_timeout: Duration::from_secs(10),
            extraction_max_tokens: 256,
        }
    }
}

impl IntakeConfig {
    /// Build the config from `VOICE_INTAKE_*` environment variables.
    ///
    /// Unset variables fall back to defaults; a variable that is set but
    /// unparseable is a startup error rather than a silent default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse_var(get("VOICE_INTAKE_PORT"), "VOICE_INTAKE_PORT", defaults.port)?;
        let model = get("VOICE_INTAKE_MODEL").unwrap_or(defaults.model);
        let timeout_secs = parse_var(
            get("VOICE_INTAKE_ORACLE_TIMEOUT_SECS"),
            "VOICE_INTAKE_ORACLE_TIMEOUT_SECS",
            defaults.oracle_timeout.as_secs(),
        )?;

        Ok(Self {
            port,
            model,
            oracle_timeout: Duration::from_secs(timeout_secs),
            extraction_max_tokens: defaults.extraction_max_tokens,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    raw: Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("cannot parse {raw:?}"),
        }),
        None => Ok(default),
    }
}
