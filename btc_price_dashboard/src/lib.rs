use std::sync::Arc;

pub mod config;
pub mod errors;
pub mod holders;
pub mod models;
pub mod render;
pub mod routers;
pub mod services;

pub use config::{load_config, AppConfig, UpdateMode};
pub use errors::{DashboardError, ErrorKind, Result};
pub use holders::{RollingBuffer, SnapshotHolder, BUFFER_CAPACITY};
pub use models::{
    ApiEnvelope, ChartPoint, ConnectionStatus, DashboardSnapshot, DerivedMetrics, PricePoint,
    PriceUpdate, PriceUpdateEvent,
};
pub use services::{
    DashboardRunner, MockGenerator, PollSource, PriceFeed, ProxyService, PushSource,
    RefreshController, RefreshEvent, RunnerHandle, UpdateSource, UpstreamClient,
};

#[derive(Clone)]
pub struct AppState {
    pub proxy: ProxyService,
    pub dashboard: SnapshotHolder,
    pub config: Arc<AppConfig>,
}
