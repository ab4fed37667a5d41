use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::errors::Result;
use crate::holders::SnapshotHolder;
use crate::services::controller::RefreshController;
use crate::services::feed::PriceFeed;
use crate::services::source::UpdateSource;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Owns a [`RefreshController`] for its whole life: loads history once, then
/// applies source events one at a time and publishes a snapshot after each.
pub struct DashboardRunner {
    controller: RefreshController,
    feed: Arc<dyn PriceFeed>,
    source: Box<dyn UpdateSource>,
    holder: SnapshotHolder,
}

/// Handle to a running [`DashboardRunner`].
pub struct RunnerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<RefreshController>,
}

impl RunnerHandle {
    /// Stops the update source, tears the controller down and hands it back.
    pub async fn shutdown(self) -> Result<RefreshController> {
        let _ = self.shutdown.send(());
        Ok(self.task.await?)
    }
}

impl DashboardRunner {
    pub fn new(
        feed: Arc<dyn PriceFeed>,
        source: Box<dyn UpdateSource>,
        holder: SnapshotHolder,
    ) -> Self {
        DashboardRunner {
            controller: RefreshController::new(),
            feed,
            source,
            holder,
        }
    }

    pub fn spawn(self) -> RunnerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(shutdown_rx));
        RunnerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(self, mut shutdown: oneshot::Receiver<()>) -> RefreshController {
        let DashboardRunner {
            mut controller,
            feed,
            source,
            holder,
        } = self;

        holder.set(controller.snapshot()).await;

        // A failed load sets the banner; updates keep flowing regardless.
        let loaded = tokio::select! {
            biased;
            _ = &mut shutdown => false,
            _ = controller.load_history(feed.as_ref()) => true,
        };

        if !loaded {
            controller.teardown();
            holder.set(controller.snapshot()).await;
            return controller;
        }
        holder.set(controller.snapshot()).await;

        let (events_tx, mut events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tracing::info!("Starting {} update source", source.name());
        let source_task = source.start(events_tx);

        loop {
            let received = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                event = events_rx.recv() => event,
            };

            match received {
                Some(event) => {
                    controller.handle_event(event);
                    holder.set(controller.snapshot()).await;
                }
                None => {
                    tracing::info!("Update source finished; keeping last known prices");
                    let _ = (&mut shutdown).await;
                    break;
                }
            }
        }

        source_task.abort();
        events_rx.close();
        controller.teardown();
        holder.set(controller.snapshot()).await;
        controller
    }
}
