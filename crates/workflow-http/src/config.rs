//! Client configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default service address
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while setting up the HTTP backend
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Where the workflow service lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("Loaded client configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeoutSecs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL without a trailing slash
    pub(crate) fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
