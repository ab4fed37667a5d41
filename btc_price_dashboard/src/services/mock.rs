use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::config::AppConfig;
use crate::models::{round_cents, PricePoint};

pub const DEFAULT_BASE_PRICE: f64 = 86300.0;
pub const DEFAULT_JITTER: f64 = 100.0;
pub const MOCK_LIST_LEN: usize = 10;

/// Produces stand-in price points when the backend cannot be reached.
///
/// Prices fall in `base_price ± jitter / 2`.
#[derive(Clone, Debug)]
pub struct MockGenerator {
    base_price: f64,
    jitter: f64,
    spacing: Duration,
}

impl MockGenerator {
    pub fn new(base_price: f64, jitter: f64) -> Self {
        MockGenerator {
            base_price,
            jitter,
            spacing: Duration::seconds(5),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.mock_base_price, config.mock_jitter)
    }

    pub fn latest(&self) -> PricePoint {
        self.point_at(&mut rand::rng(), Utc::now())
    }

    pub fn list(&self) -> Vec<PricePoint> {
        self.list_at(&mut rand::rng(), Utc::now())
    }

    pub fn point_at<R: Rng + ?Sized>(&self, rng: &mut R, at: DateTime<Utc>) -> PricePoint {
        let variation = (rng.random::<f64>() - 0.5) * self.jitter;
        PricePoint {
            id: Some(format!("mock_{}", at.timestamp_millis())),
            price: round_cents(self.base_price + variation),
            created_at: at,
            version: Some(0),
        }
    }

    /// Ten points spaced `spacing` apart, newest (`now`) first.
    pub fn list_at<R: Rng + ?Sized>(&self, rng: &mut R, now: DateTime<Utc>) -> Vec<PricePoint> {
        let mut points: Vec<PricePoint> = (0..MOCK_LIST_LEN as i32)
            .map(|i| self.point_at(rng, now - self.spacing * i))
            .collect();
        points.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        points
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_PRICE, DEFAULT_JITTER)
    }
}
