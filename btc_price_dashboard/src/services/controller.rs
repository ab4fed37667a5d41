use chrono::{DateTime, Local, TimeZone, Utc};

use crate::errors::{DashboardError, Result};
use crate::holders::RollingBuffer;
use crate::models::{
    ChartPoint, ConnectionStatus, DashboardSnapshot, DerivedMetrics, PricePoint, PriceUpdate,
};
use crate::services::feed::PriceFeed;
use crate::services::source::RefreshEvent;

pub const HISTORY_ERROR_MESSAGE: &str = "Error fetching historical BTC data.";

/// Time label used on the chart's x axis, e.g. `3:04:05 PM`.
const CHART_TIME_FORMAT: &str = "%-I:%M:%S %p";

/// State behind the price chart: the rolling buffer plus the flags the page
/// shell renders around it.
///
/// All mutation goes through `&mut self`, so whoever owns the controller
/// serializes updates.
#[derive(Debug)]
pub struct RefreshController {
    buffer: RollingBuffer,
    loading: bool,
    error: Option<String>,
    connection: ConnectionStatus,
    last_update: Option<DateTime<Utc>>,
    torn_down: bool,
}

impl RefreshController {
    pub fn new() -> Self {
        RefreshController {
            buffer: RollingBuffer::new(),
            loading: true,
            error: None,
            connection: ConnectionStatus::Connecting,
            last_update: None,
            torn_down: false,
        }
    }

    /// Fetches the initial history from `feed` and installs it.
    pub async fn load_history(&mut self, feed: &dyn PriceFeed) -> Result<Vec<PricePoint>> {
        let result = feed.history().await;
        self.apply_history(result)
    }

    /// Installs the outcome of a history fetch.
    ///
    /// Success replaces the buffer wholesale; failure empties it and raises the
    /// error banner. Loading ends either way.
    pub fn apply_history(
        &mut self,
        result: Result<Vec<PricePoint>>,
    ) -> Result<Vec<PricePoint>> {
        if self.torn_down {
            tracing::debug!("Ignoring history that arrived after teardown");
            return Ok(Vec::new());
        }

        self.loading = false;
        match result {
            Ok(points) => {
                self.buffer.replace(points);
                self.error = None;
                self.last_update = Some(Utc::now());
                tracing::info!("Loaded {} historical BTC prices", self.buffer.len());
                Ok(self.buffer.to_vec())
            }
            Err(e) => {
                tracing::error!("Error fetching historical BTC data: {}", e);
                self.buffer.clear();
                self.error = Some(HISTORY_ERROR_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    /// Prepends one point or a newest-first batch, keeping at most ten.
    pub fn apply_update(&mut self, update: impl Into<PriceUpdate>) {
        if self.torn_down {
            tracing::debug!("Ignoring price update after teardown");
            return;
        }

        match update.into() {
            PriceUpdate::Single(point) => self.buffer.push_front(point),
            PriceUpdate::Batch(points) if points.is_empty() => {
                tracing::debug!("Ignoring empty price batch");
                return;
            }
            PriceUpdate::Batch(points) => {
                for point in points.into_iter().rev() {
                    self.buffer.push_front(point);
                }
            }
        }
        self.last_update = Some(Utc::now());
    }

    /// Routes one event from an update source.
    pub fn handle_event(&mut self, event: RefreshEvent) {
        match event {
            RefreshEvent::Connected => {
                tracing::info!("Push channel connected");
                self.set_connection(ConnectionStatus::Realtime);
            }
            RefreshEvent::Disconnected => {
                tracing::warn!("Push channel disconnected");
                self.set_connection(ConnectionStatus::Disconnected);
            }
            RefreshEvent::Polling => self.set_connection(ConnectionStatus::Polling),
            RefreshEvent::Update(update) => self.apply_update(update),
            RefreshEvent::Failed(e) => self.record_source_failure(&e),
        }
    }

    /// Update failures are only logged; the chart keeps its last good data.
    pub fn record_source_failure(&self, error: &DashboardError) {
        tracing::warn!(kind = ?error.kind(), "Dropping failed price update: {}", error);
    }

    pub fn set_connection(&mut self, status: ConnectionStatus) {
        if !self.torn_down {
            self.connection = status;
        }
    }

    pub fn derive_metrics(&self) -> DerivedMetrics {
        let latest_price = self.buffer.latest().map(|p| p.price).unwrap_or(0.0);
        let previous_price = self.buffer.previous().map(|p| p.price).unwrap_or(0.0);
        let price_change = latest_price - previous_price;
        let price_change_percentage = if previous_price != 0.0 {
            price_change / previous_price * 100.0
        } else {
            0.0
        };

        DerivedMetrics {
            latest_price,
            previous_price,
            price_change,
            price_change_percentage,
            is_price_up: price_change >= 0.0,
        }
    }

    /// Buffer contents oldest-first with local time labels.
    pub fn format_for_chart(&self) -> Vec<ChartPoint> {
        self.format_for_chart_in(&Local)
    }

    pub fn format_for_chart_in<Tz: TimeZone>(&self, tz: &Tz) -> Vec<ChartPoint>
    where
        Tz::Offset: std::fmt::Display,
    {
        let mut points: Vec<&PricePoint> = self.buffer.iter().collect();
        points.sort_by_key(|p| p.created_at);
        points
            .into_iter()
            .map(|p| ChartPoint {
                price: p.price,
                created_at: p.created_at,
                formatted_date: p
                    .created_at
                    .with_timezone(tz)
                    .format(CHART_TIME_FORMAT)
                    .to_string(),
            })
            .collect()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            loading: self.loading,
            error: self.error.clone(),
            connection: self.connection,
            last_updated: self.last_update,
            metrics: self.derive_metrics(),
            points: self.buffer.to_vec(),
            chart: self.format_for_chart(),
        }
    }

    /// Closes the controller; anything arriving afterwards is dropped.
    pub fn teardown(&mut self) {
        if !self.torn_down {
            tracing::info!("Refresh controller torn down with {} points", self.buffer.len());
        }
        self.torn_down = true;
        self.connection = ConnectionStatus::Disconnected;
    }

    pub fn points(&self) -> Vec<PricePoint> {
        self.buffer.to_vec()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Default for RefreshController {
    fn default() -> Self {
        Self::new()
    }
}
