use crate::broadcast::UpdateBus;
use crate::models::DashboardData;
use crate::sync::SyncClient;
use crate::ticker::TickerFrame;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::{Mutex, watch};

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub goals_path: PathBuf,
    pub data: Arc<Mutex<DashboardData>>,
    pub bus: UpdateBus,
    pub sync: SyncClient,
    pub frames: watch::Receiver<TickerFrame>,
}

impl AppState {
    pub fn new(
        data_path: PathBuf,
        goals_path: PathBuf,
        data: DashboardData,
        bus: UpdateBus,
        sync: SyncClient,
        frames: watch::Receiver<TickerFrame>,
    ) -> Self {
        Self {
            data_path,
            goals_path,
            data: Arc::new(Mutex::new(data)),
            bus,
            sync,
            frames,
        }
    }
}
