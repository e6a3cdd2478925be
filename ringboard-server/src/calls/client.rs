//! Call platform REST client (Vapi-style API)

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::upstream::{UpstreamError, check_status, endpoint};

/// Default request timeout for the HTTP client. Backfill applies its own,
/// tighter per-request bound on top.
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Upstream call-records API
#[async_trait]
pub trait CallApi: Send + Sync {
    /// Most recent calls, newest first
    async fn list_calls(&self, api_key: &str, limit: u32) -> Result<Vec<Value>, UpstreamError>;

    /// Full record of one call
    async fn get_call(&self, api_key: &str, call_id: &str) -> Result<Value, UpstreamError>;
}

pub struct VapiClient {
    http: reqwest::Client,
    base_url: String,
}

impl VapiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CallApi for VapiClient {
    async fn list_calls(&self, api_key: &str, limit: u32) -> Result<Vec<Value>, UpstreamError> {
        let resp = self
            .http
            .get(endpoint(&self.base_url, &["call"])?)
            .bearer_auth(api_key)
            .query(&[("limit", limit.to_string()), ("sortOrder", "DESC".to_string())])
            .send()
            .await?;
        let body: Value = check_status(resp).await?.json().await?;
        calls_from_body(body)
    }

    async fn get_call(&self, api_key: &str, call_id: &str) -> Result<Value, UpstreamError> {
        let resp = self
            .http
            .get(endpoint(&self.base_url, &["call", call_id])?)
            .bearer_auth(api_key)
            .send()
            .await?;
        Ok(check_status(resp).await?.json().await?)
    }
}

/// The list endpoint answers with a bare array or `{results: [...]}`
fn calls_from_body(body: Value) -> Result<Vec<Value>, UpstreamError> {
    match body {
        Value::Array(calls) => Ok(calls),
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(calls)) => Ok(calls),
            _ => Err(UpstreamError::InvalidResponse(
                "call list has no results array".into(),
            )),
        },
        other => Err(UpstreamError::InvalidResponse(format!(
            "call list is not an array: {other}"
        ))),
    }
}
