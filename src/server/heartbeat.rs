use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::common::config::AgentConfig;
use crate::common::utils::{now_unix_secs, periodic};
use crate::traits::stat_source::StatSource;

/// Node status document accepted by the backend's heartbeat route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    #[serde(rename = "nodeID")]
    pub node_id: String,
    pub node_type: String,
    pub cpu: String,
    pub memory: String,
    pub network: String,
    pub timestamp: i64, // seconds since UNIX_EPOCH
}

pub struct Heartbeat<S> {
    node_id: String,
    node_type: String,
    endpoint: String,
    http: reqwest::Client,
    stats: S,
}

impl<S: StatSource + Sync> Heartbeat<S> {
    pub fn new(config: &AgentConfig, http: reqwest::Client, stats: S) -> Self {
        Self {
            node_id: config.node_id.clone(),
            node_type: config.node_type.clone(),
            endpoint: format!("{}/heartbeat", config.backend_url),
            http,
            stats,
        }
    }

    pub async fn collect(&self) -> NodeStatus {
        NodeStatus {
            node_id: self.node_id.clone(),
            node_type: self.node_type.clone(),
            cpu: self.stats.cpu().await,
            memory: self.stats.memory().await,
            network: self.stats.network().await,
            timestamp: now_unix_secs(),
        }
    }

    pub async fn send_heartbeat(&self) -> Result<()> {
        let status = self.collect().await;
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&status)
            .send()
            .await
            .with_context(|| format!("failed to send heartbeat to {}", self.endpoint))?;

        if !resp.status().is_success() {
            anyhow::bail!("heartbeat failed with status: {}", resp.status());
        }
        log::debug!("Heartbeat sent successfully");
        Ok(())
    }

    /// First heartbeat goes out immediately, then every `interval`.
    pub async fn run(self, interval: Duration) {
        let mut ticker = periodic(interval, true);
        loop {
            ticker.tick().await;
            if let Err(e) = self.send_heartbeat().await {
                log::warn!("Failed to send heartbeat: {:?}", e);
            }
        }
    }
}
