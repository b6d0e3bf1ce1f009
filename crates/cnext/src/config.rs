//! Runtime Configuration

use serde::{Deserialize, Serialize};

/// Runtime configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL of the document components render into
    pub document_url: String,

    /// Indent serialized markup
    pub pretty_markup: bool,

    /// Filter used by [`init_logging`](crate::init_logging) when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            document_url: "about:blank".to_string(),
            pretty_markup: false,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}
