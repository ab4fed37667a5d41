// errors.rs
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinError;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend API responded with status: {0}")]
    UpstreamStatus(reqwest::StatusCode),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid data format: {0}")]
    InvalidDataFormat(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Push channel closed: {0}")]
    ChannelClosed(String),

    #[error("Task failed: {0}")]
    TaskError(#[from] JoinError),
}

/// Coarse failure classes used when deciding how loudly to report an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Parse,
    Channel,
    Internal,
}

impl DashboardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DashboardError::HttpError(e) if e.is_decode() => ErrorKind::Parse,
            DashboardError::HttpError(_)
            | DashboardError::Timeout(_)
            | DashboardError::UpstreamStatus(_) => ErrorKind::Fetch,
            DashboardError::JsonError(_) | DashboardError::InvalidDataFormat(_) => {
                ErrorKind::Parse
            }
            DashboardError::WebSocketError(_) | DashboardError::ChannelClosed(_) => {
                ErrorKind::Channel
            }
            DashboardError::ConfigError(_) | DashboardError::TaskError(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
