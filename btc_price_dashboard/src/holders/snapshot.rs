use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::DashboardSnapshot;

/// Latest dashboard frame, written by the refresh runner and read by the routes.
#[derive(Clone, Default)]
pub struct SnapshotHolder {
    snapshot: Arc<Mutex<DashboardSnapshot>>,
}

impl SnapshotHolder {
    pub fn new() -> Self {
        SnapshotHolder {
            snapshot: Arc::new(Mutex::new(DashboardSnapshot::default())),
        }
    }

    pub async fn set(&self, snapshot: DashboardSnapshot) {
        let mut current = self.snapshot.lock().await;
        *current = snapshot;
    }

    pub async fn get(&self) -> DashboardSnapshot {
        let current = self.snapshot.lock().await;
        current.clone()
    }
}
