//! OAuth2 client-credentials token exchange.
//!
//! Each lookup batch fetches a fresh access token. Tokens are deliberately
//! not cached: the exchange is cheap relative to the lookup fan-out and a
//! stateless client cannot serve a stale or revoked token.

use serde::Deserialize;
use tracing::debug;

use pylon_core::{Error, Result};

use crate::config::DirectoryConfig;

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange client credentials for a bearer access token.
pub async fn fetch_access_token(
    http_client: &reqwest::Client,
    config: &DirectoryConfig,
) -> Result<String> {
    debug!(
        subsystem = "directory",
        component = "token",
        op = "fetch",
        token_url = %config.token_url,
        client_id = %config.client_id,
        "Fetching access token"
    );

    let form = [
        ("grant_type", "client_credentials"),
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
    ];

    let response = http_client
        .post(&config.token_url)
        .form(&form)
        .send()
        .await
        .map_err(|e| Error::Unauthorized(format!("token request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        return Err(Error::Unauthorized(format!(
            "token endpoint returned {status}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| Error::Unauthorized(format!("malformed token response: {e}")))?;

    Ok(token.access_token)
}
