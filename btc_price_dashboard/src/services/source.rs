use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::errors::DashboardError;
use crate::models::PriceUpdate;
use crate::services::feed::PriceFeed;

/// Everything an update source can tell the refresh controller.
#[derive(Debug)]
pub enum RefreshEvent {
    Connected,
    Disconnected,
    Polling,
    Update(PriceUpdate),
    Failed(DashboardError),
}

/// Strategy that feeds new prices to the controller once history is loaded.
///
/// `start` spawns the source's own task; the returned handle is aborted on
/// teardown, which clears timers and drops connections.
pub trait UpdateSource: Send {
    fn name(&self) -> &'static str;

    fn start(self: Box<Self>, events: mpsc::Sender<RefreshEvent>) -> JoinHandle<()>;
}

/// Timed pull: asks the feed for the latest point every `interval`.
pub struct PollSource {
    feed: Arc<dyn PriceFeed>,
    interval: Duration,
}

impl PollSource {
    pub fn new(feed: Arc<dyn PriceFeed>, interval: Duration) -> Self {
        PollSource { feed, interval }
    }
}

impl UpdateSource for PollSource {
    fn name(&self) -> &'static str {
        "poll"
    }

    fn start(self: Box<Self>, events: mpsc::Sender<RefreshEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            if events.send(RefreshEvent::Polling).await.is_err() {
                return;
            }

            // The first tick would fire immediately, right on top of the history load.
            let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let event = match self.feed.latest().await {
                    Ok(point) => RefreshEvent::Update(point.into()),
                    Err(e) => RefreshEvent::Failed(e),
                };
                if events.send(event).await.is_err() {
                    tracing::debug!("Refresh controller gone, stopping poll loop");
                    break;
                }
            }
        })
    }
}
