//! Environment-driven configuration for the domain collaborators

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default text-generation model
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Default Gemini REST endpoint root
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default client-side timeout for one collaborator call
pub const DEFAULT_AI_TIMEOUT_SECONDS: u64 = 60;

/// Configuration errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Settings for the text-generation service
#[derive(Debug, Clone, PartialEq)]
pub struct AiConfig {
    /// API key; `None` leaves the service unconfigured
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECONDS),
        }
    }
}

impl AiConfig {
    /// Read `GEMINI_API_KEY` (or `API_KEY`), `GEMINI_MODEL`, `GEMINI_BASE_URL`
    /// and `AI_TIMEOUT_SECONDS`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let model = lookup("GEMINI_MODEL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.model);

        let base_url = lookup("GEMINI_BASE_URL")
            .filter(|value| !value.trim().is_empty())
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);

        let timeout = match lookup("AI_TIMEOUT_SECONDS") {
            Some(raw) => {
                let seconds = raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    name: "AI_TIMEOUT_SECONDS".to_string(),
                    reason: e.to_string(),
                })?;
                if seconds == 0 {
                    return Err(ConfigError::InvalidValue {
                        name: "AI_TIMEOUT_SECONDS".to_string(),
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_secs(seconds)
            }
            None => defaults.timeout,
        };

        Ok(Self {
            api_key,
            model,
            base_url,
            timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
