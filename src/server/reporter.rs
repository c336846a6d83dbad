use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::common::utils::periodic;
use crate::storage::rtt_store::RttStore;

/// Pushes the local RTT vector to the backend. At-most-once: a failed push is
/// dropped and superseded by the next cycle.
pub struct Reporter {
    endpoint: String,
    http: reqwest::Client,
    rtt_store: Arc<RttStore>,
}

impl Reporter {
    pub fn new(backend_url: &str, http: reqwest::Client, rtt_store: Arc<RttStore>) -> Self {
        Self {
            endpoint: format!("{}/api/rtt", backend_url),
            http,
            rtt_store,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn report_once(&self) -> Result<()> {
        let vector = self.rtt_store.local_vector();
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&vector)
            .send()
            .await
            .with_context(|| format!("failed to push RTT to {}", self.endpoint))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("RTT push to {} failed with status: {}", self.endpoint, status);
        }
        log::debug!("RTT vector with {} entries pushed", vector.len());
        Ok(())
    }

    pub async fn run(self, report_interval: Duration) {
        let mut ticker = periodic(report_interval, false);
        loop {
            ticker.tick().await;
            if let Err(e) = self.report_once().await {
                log::warn!("RTT push dropped: {:?}", e);
            }
        }
    }
}
