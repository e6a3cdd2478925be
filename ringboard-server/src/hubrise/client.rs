//! HubRise REST client

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::upstream::{UpstreamError, check_status, endpoint};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Order events the callback subscribes to
pub const ORDER_EVENTS: &[&str] = &["create", "update"];

/// OAuth token grant for one location
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until expiry, absent for non-expiring tokens
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub account_id: Option<String>,
}

#[async_trait]
pub trait HubriseApi: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, UpstreamError>;

    async fn get_location(
        &self,
        location_id: &str,
        access_token: &str,
    ) -> Result<Location, UpstreamError>;

    /// Point the location's order callback at `callback_url`
    async fn register_webhook(
        &self,
        access_token: &str,
        callback_url: &str,
        order_events: &[&str],
    ) -> Result<(), UpstreamError>;
}

pub struct HubriseClient {
    http: reqwest::Client,
    oauth_url: String,
    api_url: String,
    client_id: String,
    client_secret: String,
}

impl HubriseClient {
    pub fn new(
        oauth_url: &str,
        api_url: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?,
            oauth_url: oauth_url.trim_end_matches('/').to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        })
    }
}

#[async_trait]
impl HubriseApi for HubriseClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, UpstreamError> {
        let resp = self
            .http
            .post(endpoint(&self.oauth_url, &["oauth2", "v1", "token"])?)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;
        Ok(check_status(resp).await?.json().await?)
    }

    async fn get_location(
        &self,
        location_id: &str,
        access_token: &str,
    ) -> Result<Location, UpstreamError> {
        let resp = self
            .http
            .get(endpoint(&self.api_url, &["v1", "locations", location_id])?)
            .header("X-Access-Token", access_token)
            .send()
            .await?;
        Ok(check_status(resp).await?.json().await?)
    }

    async fn register_webhook(
        &self,
        access_token: &str,
        callback_url: &str,
        order_events: &[&str],
    ) -> Result<(), UpstreamError> {
        let resp = self
            .http
            .post(endpoint(&self.api_url, &["v1", "callback"])?)
            .header("X-Access-Token", access_token)
            .json(&serde_json::json!({
                "url": callback_url,
                "events": { "order": order_events },
            }))
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }
}
