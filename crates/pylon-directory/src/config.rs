//! Directory client configuration from environment variables.

use std::time::Duration;

use pylon_core::{defaults, Error, Result};

/// Configuration for the recipient directory client.
#[derive(Clone)]
pub struct DirectoryConfig {
    /// Base URL of the user directory service.
    pub base_url: String,
    /// Token endpoint for the client-credentials exchange.
    pub token_url: String,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("base_url", &self.base_url)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DirectoryConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `DIRECTORY_BASE_URL`, `DIRECTORY_TOKEN_URL`,
    /// `DIRECTORY_CLIENT_ID`, `DIRECTORY_CLIENT_SECRET`.
    /// Optional: `DIRECTORY_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let require = |key: &str| -> Result<String> {
            std::env::var(key).map_err(|_| Error::Config(format!("{key} not set")))
        };

        let timeout_secs = std::env::var("DIRECTORY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::DIRECTORY_TIMEOUT_SECS);

        Ok(Self {
            base_url: require("DIRECTORY_BASE_URL")?,
            token_url: require("DIRECTORY_TOKEN_URL")?,
            client_id: require("DIRECTORY_CLIENT_ID")?,
            client_secret: require("DIRECTORY_CLIENT_SECRET")?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Build a configuration directly (tests and embedding callers).
    pub fn new(
        base_url: impl Into<String>,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout: Duration::from_secs(defaults::DIRECTORY_TIMEOUT_SECS),
        }
    }
}
