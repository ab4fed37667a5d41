use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{DashboardError, Result};

/// One BTC/USD observation as exchanged with the backend and the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "__v", alias = "version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl PricePoint {
    pub fn new(price: f64, created_at: DateTime<Utc>) -> Self {
        PricePoint {
            id: None,
            price: round_cents(price),
            created_at,
            version: None,
        }
    }
}

/// Rounds a USD amount to cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Response body shared by the backend and the proxy routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub errors: Map<String, Value>,
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        ApiEnvelope {
            errors: Map::new(),
            data,
        }
    }
}

/// Backends disagree on whether "latest" is an object or a one-element list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(PricePoint),
    Many(Vec<PricePoint>),
}

impl OneOrMany {
    pub fn into_latest(self) -> Result<PricePoint> {
        match self {
            OneOrMany::One(point) => Ok(point),
            OneOrMany::Many(points) => points.into_iter().next().ok_or_else(|| {
                DashboardError::InvalidDataFormat("latest price list is empty".to_string())
            }),
        }
    }
}

/// Payload of a `priceUpdate` push event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdateEvent {
    #[serde(default)]
    pub currency: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<PriceUpdateEvent> for PricePoint {
    fn from(event: PriceUpdateEvent) -> Self {
        PricePoint::new(event.price, event.timestamp)
    }
}

/// A single point or a newest-first batch handed to the refresh controller.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceUpdate {
    Single(PricePoint),
    Batch(Vec<PricePoint>),
}

impl From<PricePoint> for PriceUpdate {
    fn from(point: PricePoint) -> Self {
        PriceUpdate::Single(point)
    }
}

impl From<Vec<PricePoint>> for PriceUpdate {
    fn from(points: Vec<PricePoint>) -> Self {
        PriceUpdate::Batch(points)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub latest_price: f64,
    pub previous_price: f64,
    pub price_change: f64,
    pub price_change_percentage: f64,
    pub is_price_up: bool,
}

impl Default for DerivedMetrics {
    fn default() -> Self {
        DerivedMetrics {
            latest_price: 0.0,
            previous_price: 0.0,
            price_change: 0.0,
            price_change_percentage: 0.0,
            is_price_up: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub formatted_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connecting,
    Realtime,
    Disconnected,
    Polling,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Realtime => "Realtime",
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Polling => "Polling",
        }
    }
}

/// Everything the page shell needs to draw one frame of the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub loading: bool,
    pub error: Option<String>,
    pub connection: ConnectionStatus,
    pub last_updated: Option<DateTime<Utc>>,
    pub metrics: DerivedMetrics,
    pub points: Vec<PricePoint>,
    pub chart: Vec<ChartPoint>,
}

impl Default for DashboardSnapshot {
    fn default() -> Self {
        DashboardSnapshot {
            loading: true,
            error: None,
            connection: ConnectionStatus::Connecting,
            last_updated: None,
            metrics: DerivedMetrics::default(),
            points: Vec::new(),
            chart: Vec::new(),
        }
    }
}
