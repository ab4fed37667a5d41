use std::time::Duration;

use anyhow::Result;
use config::Config;
use serde::Deserialize;

/// How the refresh controller learns about new prices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    Poll,
    Push,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub bind_addr: String,
    pub backend_url: String,
    pub upstream_timeout_secs: u64,
    pub update_mode: UpdateMode,
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub push_channel_url: Option<String>,
    #[serde(default)]
    pub feed_url: Option<String>,
    pub mock_base_price: f64,
    pub mock_jitter: f64,
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl AppConfig {
    /// Rejects values the service cannot start with.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|e| anyhow::anyhow!("bind_addr '{}' is invalid: {}", self.bind_addr, e))?;

        reqwest::Url::parse(&self.backend_url)
            .map_err(|e| anyhow::anyhow!("backend_url '{}' is invalid: {}", self.backend_url, e))?;

        if let Some(feed_url) = &self.feed_url {
            reqwest::Url::parse(feed_url)
                .map_err(|e| anyhow::anyhow!("feed_url '{}' is invalid: {}", feed_url, e))?;
        }

        if self.upstream_timeout_secs == 0 || self.upstream_timeout_secs > 60 {
            return Err(anyhow::anyhow!("upstream_timeout_secs must be between 1 and 60"));
        }

        if self.poll_interval_secs == 0 || self.poll_interval_secs > 3600 {
            return Err(anyhow::anyhow!("poll_interval_secs must be between 1 and 3600"));
        }

        if !(self.mock_base_price.is_finite() && self.mock_base_price > 0.0) {
            return Err(anyhow::anyhow!("mock_base_price must be a positive number"));
        }

        if !(self.mock_jitter.is_finite() && self.mock_jitter >= 0.0) {
            return Err(anyhow::anyhow!("mock_jitter cannot be negative"));
        }

        if self.update_mode == UpdateMode::Push {
            match self.push_channel_url.as_deref() {
                Some(url) if url.starts_with("ws://") || url.starts_with("wss://") => {}
                Some(url) => {
                    return Err(anyhow::anyhow!(
                        "push_channel_url '{}' must use ws:// or wss://",
                        url
                    ))
                }
                None => {
                    return Err(anyhow::anyhow!(
                        "push_channel_url is required when update_mode is push"
                    ))
                }
            }
        }

        Ok(())
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

pub fn load_config() -> Result<AppConfig> {
    // Load .env if present
    dotenvy::dotenv().ok();

    let settings = Config::builder()
        .set_default("bind_addr", "0.0.0.0:8080")?
        .set_default("backend_url", "http://localhost:3000")?
        .set_default("upstream_timeout_secs", 5_i64)?
        .set_default("update_mode", "poll")?
        .set_default("poll_interval_secs", 5_i64)?
        .set_default("mock_base_price", 86300.0)?
        .set_default("mock_jitter", 100.0)?
        .add_source(config::File::with_name("config").required(false))
        .add_source(config::Environment::with_prefix("BTC_DASHBOARD"))
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.validate()?;

    Ok(config)
}
