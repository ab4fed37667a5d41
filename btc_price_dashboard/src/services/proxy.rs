use async_trait::async_trait;

use crate::errors::Result;
use crate::holders::BUFFER_CAPACITY;
use crate::models::{ApiEnvelope, PricePoint};
use crate::services::feed::PriceFeed;
use crate::services::mock::MockGenerator;
use crate::services::upstream::UpstreamClient;

/// Where a proxied payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Upstream,
    Mock,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Upstream => "upstream",
            DataSource::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyResponse<T> {
    pub body: ApiEnvelope<T>,
    pub source: DataSource,
}

/// Serves backend prices and substitutes generated ones whenever the backend
/// fails, so callers never see an upstream error.
#[derive(Clone)]
pub struct ProxyService {
    upstream: UpstreamClient,
    mock: MockGenerator,
}

impl ProxyService {
    pub fn new(upstream: UpstreamClient, mock: MockGenerator) -> Self {
        ProxyService { upstream, mock }
    }

    pub async fn latest(&self) -> ProxyResponse<PricePoint> {
        tracing::info!("Attempting to fetch latest from: {}", self.upstream.base_url());

        match self.upstream.fetch_latest().await {
            Ok(point) => {
                tracing::info!("Successfully fetched latest data from backend");
                ProxyResponse {
                    body: ApiEnvelope::ok(point),
                    source: DataSource::Upstream,
                }
            }
            Err(e) => {
                tracing::error!("Error in latest API route: {}", e);
                tracing::warn!("Returning mock latest data");
                ProxyResponse {
                    body: ApiEnvelope::ok(self.mock.latest()),
                    source: DataSource::Mock,
                }
            }
        }
    }

    pub async fn list(&self) -> ProxyResponse<Vec<PricePoint>> {
        tracing::info!("Attempting to fetch list from: {}", self.upstream.base_url());

        match self.upstream.fetch_list().await {
            Ok(mut points) => {
                points.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                points.truncate(BUFFER_CAPACITY);
                tracing::info!("Successfully fetched {} list points from backend", points.len());
                ProxyResponse {
                    body: ApiEnvelope::ok(points),
                    source: DataSource::Upstream,
                }
            }
            Err(e) => {
                tracing::error!("Error in list API route: {}", e);
                tracing::warn!("Returning mock list data");
                ProxyResponse {
                    body: ApiEnvelope::ok(self.mock.list()),
                    source: DataSource::Mock,
                }
            }
        }
    }
}

#[async_trait]
impl PriceFeed for ProxyService {
    async fn latest(&self) -> Result<PricePoint> {
        Ok(ProxyService::latest(self).await.body.data)
    }

    async fn history(&self) -> Result<Vec<PricePoint>> {
        Ok(self.list().await.body.data)
    }
}
