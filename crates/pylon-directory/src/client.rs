//! HTTP recipient directory client.
//!
//! Resolves roles and sites to user ids against the external user
//! directory. Every failure path degrades to an empty recipient list:
//! audience resolution must never take down ingestion, and the stored
//! event remains available for a later manual replay.

use async_trait::async_trait;
use tracing::{debug, warn};

use pylon_core::{RecipientDirectory, Result};

use crate::config::DirectoryConfig;
use crate::token::fetch_access_token;

/// Directory client backed by the external user service.
#[derive(Debug, Clone)]
pub struct HttpRecipientDirectory {
    config: DirectoryConfig,
    http_client: reqwest::Client,
}

impl HttpRecipientDirectory {
    /// Build a client from configuration.
    pub fn new(config: DirectoryConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| pylon_core::Error::Config(format!("http client: {e}")))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    async fn fetch_ids(&self, token: &str, path: &str) -> Result<Vec<String>> {
        let url = format!("{}{path}", self.config.base_url);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(pylon_core::Error::Directory(format!(
                "{url} returned {}",
                response.status()
            )));
        }

        let ids: Vec<String> = response.json().await?;
        Ok(ids)
    }

    async fn ids_for_role(&self, token: &str, role: &str) -> Result<Vec<String>> {
        self.fetch_ids(token, &format!("/users/ids/role/{role}")).await
    }

    async fn ids_for_site(&self, token: &str, site: &str) -> Result<Vec<String>> {
        self.fetch_ids(token, &format!("/users/ids/pilot/{site}")).await
    }
}

#[async_trait]
impl RecipientDirectory for HttpRecipientDirectory {
    async fn user_ids_for_roles(&self, roles: &[String]) -> Vec<String> {
        if roles.is_empty() {
            return Vec::new();
        }

        // One token per batch; a failed exchange short-circuits every
        // role lookup in it.
        let token = match fetch_access_token(&self.http_client, &self.config).await {
            Ok(t) => t,
            Err(e) => {
                warn!(
                    subsystem = "directory",
                    component = "client",
                    op = "user_ids_for_roles",
                    role_count = roles.len(),
                    error = %e,
                    "Token exchange failed, resolving to no recipients"
                );
                return Vec::new();
            }
        };

        let mut ids = Vec::new();
        for role in roles {
            match self.ids_for_role(&token, role).await {
                Ok(role_ids) => {
                    debug!(
                        subsystem = "directory",
                        component = "client",
                        op = "user_ids_for_roles",
                        role = %role,
                        recipient_count = role_ids.len(),
                        "Resolved role"
                    );
                    ids.extend(role_ids);
                }
                Err(e) => {
                    warn!(
                        subsystem = "directory",
                        component = "client",
                        op = "user_ids_for_roles",
                        role = %role,
                        error = %e,
                        "Role lookup failed, skipping role"
                    );
                }
            }
        }
        ids
    }

    async fn user_ids_for_site(&self, site: &str) -> Vec<String> {
        let token = match fetch_access_token(&self.http_client, &self.config).await {
            Ok(t) => t,
            Err(e) => {
                warn!(
                    subsystem = "directory",
                    component = "client",
                    op = "user_ids_for_site",
                    site = %site,
                    error = %e,
                    "Token exchange failed, resolving to no recipients"
                );
                return Vec::new();
            }
        };

        match self.ids_for_site(&token, site).await {
            Ok(ids) => {
                debug!(
                    subsystem = "directory",
                    component = "client",
                    op = "user_ids_for_site",
                    site = %site,
                    recipient_count = ids.len(),
                    "Resolved site"
                );
                ids
            }
            Err(e) => {
                warn!(
                    subsystem = "directory",
                    component = "client",
                    op = "user_ids_for_site",
                    site = %site,
                    error = %e,
                    "Site lookup failed, resolving to no recipients"
                );
                Vec::new()
            }
        }
    }
}
