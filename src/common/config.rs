use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::common::message::MAX_MESSAGE_LEN;

pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024;

/// Raw settings as they come out of the environment. Intervals are whole seconds.
#[derive(Debug, Deserialize)]
struct RawAgentConfig {
    node_id: Option<String>,
    node_type: String,
    listen_host: String,
    rpc_port: u16,
    peer_nodes: String,
    backend_url: String,
    heartbeat_interval: u64,
    probe_interval: u64,
    report_interval: u64,
    probe_connect_timeout: u64,
    probe_timeout: u64,
    max_frame_len: usize,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub node_id: String,
    pub node_type: String,
    pub listen_host: String,
    pub rpc_port: u16,
    pub peers: Vec<String>,
    pub backend_url: String,
    pub heartbeat_interval: Duration,
    pub probe_interval: Duration,
    pub report_interval: Duration,
    pub probe_connect_timeout: Duration,
    pub probe_timeout: Duration,
    pub max_frame_len: usize,
}

impl AgentConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.rpc_port)
    }
}

pub fn load_agent_config() -> Result<AgentConfig> {
    load_agent_config_from(config::Environment::default())
}

/// Builds the agent config from an environment source. Tests hand in an
/// `Environment` with an explicit map instead of touching the process env.
pub fn load_agent_config_from(env: config::Environment) -> Result<AgentConfig> {
    let settings = config::Config::builder()
        .set_default("node_type", "edge")?
        .set_default("listen_host", "0.0.0.0")?
        .set_default("rpc_port", 50052)?
        .set_default("peer_nodes", "")?
        .set_default("backend_url", "http://backend:3000")?
        .set_default("heartbeat_interval", 30)?
        .set_default("probe_interval", 30)?
        .set_default("report_interval", 30)?
        .set_default("probe_connect_timeout", 5)?
        .set_default("probe_timeout", 5)?
        .set_default("max_frame_len", DEFAULT_MAX_FRAME_LEN as u64)?
        .add_source(env)
        .build()
        .context("failed to read agent settings")?;
    let raw: RawAgentConfig = settings
        .try_deserialize()
        .context("invalid agent settings")?;

    let node_id = match raw.node_id.map(|id| id.trim().to_string()) {
        Some(id) if !id.is_empty() => id,
        _ => hostname::get()
            .context("NODE_ID not set and hostname unavailable")?
            .to_string_lossy()
            .into_owned(),
    };
    if node_id.is_empty() {
        anyhow::bail!("node id must not be empty");
    }

    let seconds = |name: &str, value: u64| -> Result<Duration> {
        if value == 0 {
            anyhow::bail!("{} must be greater than zero", name);
        }
        Ok(Duration::from_secs(value))
    };

    if raw.max_frame_len == 0 || raw.max_frame_len > MAX_MESSAGE_LEN {
        anyhow::bail!("MAX_FRAME_LEN must be between 1 and {} bytes", MAX_MESSAGE_LEN);
    }

    Ok(AgentConfig {
        node_id,
        node_type: raw.node_type,
        listen_host: raw.listen_host,
        rpc_port: raw.rpc_port,
        peers: parse_peer_list(&raw.peer_nodes),
        backend_url: raw.backend_url.trim_end_matches('/').to_string(),
        heartbeat_interval: seconds("HEARTBEAT_INTERVAL", raw.heartbeat_interval)?,
        probe_interval: seconds("PROBE_INTERVAL", raw.probe_interval)?,
        report_interval: seconds("REPORT_INTERVAL", raw.report_interval)?,
        probe_connect_timeout: seconds("PROBE_CONNECT_TIMEOUT", raw.probe_connect_timeout)?,
        probe_timeout: seconds("PROBE_TIMEOUT", raw.probe_timeout)?,
        max_frame_len: raw.max_frame_len,
    })
}

pub fn parse_peer_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_peer_list;

    #[test]
    fn peer_list_drops_blanks() {
        assert_eq!(parse_peer_list(" a, b ,,c,"), vec!["a", "b", "c"]);
        assert!(parse_peer_list("").is_empty());
    }
}
