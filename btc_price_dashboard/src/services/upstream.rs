use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::errors::{DashboardError, Result};
use crate::models::{ApiEnvelope, OneOrMany, PricePoint};
use crate::services::feed::PriceFeed;

pub const LATEST_PATH: &str = "/btc/latest";
pub const LIST_PATH: &str = "/btc/list";

/// Thin HTTP client for a price API exposing `/btc/latest` and `/btc/list`.
///
/// Every request is bounded by `timeout`; there are no retries.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url: String = base_url.into();
        let client = Client::builder().timeout(timeout).build()?;
        Ok(UpstreamClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_latest(&self) -> Result<PricePoint> {
        let envelope: ApiEnvelope<OneOrMany> = self.get_json(LATEST_PATH).await?;
        envelope.data.into_latest()
    }

    pub async fn fetch_list(&self) -> Result<Vec<PricePoint>> {
        let envelope: ApiEnvelope<Vec<PricePoint>> = self.get_json(LIST_PATH).await?;
        Ok(envelope.data)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::UpstreamStatus(status));
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn classify(&self, error: reqwest::Error) -> DashboardError {
        if error.is_timeout() {
            DashboardError::Timeout(self.timeout)
        } else {
            DashboardError::HttpError(error)
        }
    }
}

#[async_trait]
impl PriceFeed for UpstreamClient {
    async fn latest(&self) -> Result<PricePoint> {
        self.fetch_latest().await
    }

    async fn history(&self) -> Result<Vec<PricePoint>> {
        self.fetch_list().await
    }
}
