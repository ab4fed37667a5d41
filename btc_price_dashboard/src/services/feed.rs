use async_trait::async_trait;

use crate::errors::Result;
use crate::models::PricePoint;

/// Read side the refresh controller pulls prices from.
///
/// Implemented by [`ProxyService`](crate::services::ProxyService) for the
/// in-process setup and by [`UpstreamClient`](crate::services::UpstreamClient)
/// when the dashboard reads the proxy routes over HTTP.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// The newest known point.
    async fn latest(&self) -> Result<PricePoint>;

    /// Up to ten recent points, newest first.
    async fn history(&self) -> Result<Vec<PricePoint>>;
}
