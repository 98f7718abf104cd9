//! Remnawave panel HTTP client

use super::types::{parse_services, parse_stats, pick_user, PanelStats, PanelUser, ServiceEntry};
use super::{PanelError, PanelService};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Stateless wrapper around the panel's `/api/users` endpoints
pub struct RemnawaveClient {
    client: Client,
    base_url: String,
    token: String,
}

impl RemnawaveClient {
    /// Build a client for `base_url`.
    ///
    /// Certificate validation is disabled: panels are commonly deployed with
    /// self-signed certificates behind the bot's private network.
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self, PanelError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| PanelError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    #[allow(dead_code)] // Used in tests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, path: &str) -> Result<Value, PanelError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| PanelError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PanelError::status(status.as_u16(), &body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| PanelError::from_reqwest(&e))
    }
}

#[async_trait]
impl PanelService for RemnawaveClient {
    async fn find_by_identity(&self, external_id: i64) -> Result<Option<PanelUser>, PanelError> {
        let body = self
            .get_json(&format!("/api/users/by-telegram-id/{external_id}"))
            .await?;
        pick_user(super::types::unwrap_envelope(body), external_id)
    }

    async fn get_stats(&self, panel_identity: &str) -> Result<Option<PanelStats>, PanelError> {
        let body = self.get_json(&format!("/api/users/{panel_identity}")).await?;
        parse_stats(body)
    }

    async fn list_services(&self, panel_identity: &str) -> Result<Vec<ServiceEntry>, PanelError> {
        let body = self
            .get_json(&format!("/api/users/{panel_identity}/subscription-info"))
            .await?;
        parse_services(body)
    }
}
