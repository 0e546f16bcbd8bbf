use crate::models::DashboardData;
use reqwest::Client;
use tracing::{debug, warn};

/// Fire-and-forget mirror of every committed document to an HTTP endpoint.
#[derive(Clone)]
pub struct SyncClient {
    client: Client,
    url: Option<String>,
}

impl SyncClient {
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Spawns the POST and returns immediately. Failures are logged and never
    /// retried; the local file stays authoritative.
    pub fn push(&self, data: &DashboardData) {
        let Some(url) = self.url.clone() else {
            return;
        };
        let client = self.client.clone();
        let payload = data.clone();

        tokio::spawn(async move {
            match client.post(&url).json(&payload).send().await {
                Ok(resp) if resp.status().is_success() => debug!(%url, "state synced"),
                Ok(resp) => warn!(%url, status = %resp.status(), "state sync rejected"),
                Err(err) => warn!(%url, "failed to sync state: {err}"),
            }
        });
    }
}
