use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::common::config::AgentConfig;
use crate::common::utils::periodic;
use crate::server::peer_client::PeerClient;
use crate::storage::rtt_store::RttStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub attempted: usize,
    pub recorded: usize,
    pub failed: usize,
}

/// Probes every configured peer once per cycle and records the outbound RTTs.
pub struct Prober {
    node_id: String,
    peers: Vec<String>,
    default_port: u16,
    connect_timeout: Duration,
    probe_timeout: Duration,
    max_frame_len: usize,
    rtt_store: Arc<RttStore>,
}

impl Prober {
    pub fn new(config: &AgentConfig, rtt_store: Arc<RttStore>) -> Self {
        Self {
            node_id: config.node_id.clone(),
            peers: config.peers.clone(),
            default_port: config.rpc_port,
            connect_timeout: config.probe_connect_timeout,
            probe_timeout: config.probe_timeout,
            max_frame_len: config.max_frame_len,
            rtt_store,
        }
    }

    /// Peers this node actually probes: never itself, never an empty entry.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.peers
            .iter()
            .map(|p| p.as_str())
            .filter(|p| !p.is_empty() && *p != self.node_id)
    }

    /// A bare host is dialed on the fleet-wide RPC port; `host:port` is used as is.
    pub fn peer_addr(&self, peer: &str) -> String {
        if peer.contains(':') {
            peer.to_string()
        } else {
            format!("{}:{}", peer, self.default_port)
        }
    }

    /// One probe cycle: one concurrent task per target, joined before returning.
    /// Each probe is bounded by the probe timeout, so a cycle never outlives it
    /// by more than scheduling slack.
    pub async fn probe_cycle(self: &Arc<Self>) -> CycleSummary {
        let mut probes = JoinSet::new();
        for target in self.targets() {
            let prober = Arc::clone(self);
            let target = target.to_string();
            probes.spawn(async move { prober.probe_peer(&target).await });
        }

        let mut summary = CycleSummary {
            attempted: probes.len(),
            ..Default::default()
        };
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok(true) => summary.recorded += 1,
                Ok(false) => summary.failed += 1,
                Err(e) => {
                    log::error!("Probe task panicked: {:?}", e);
                    summary.failed += 1;
                }
            }
        }
        log::debug!(
            "Probe cycle done: {} attempted, {} recorded, {} failed",
            summary.attempted, summary.recorded, summary.failed
        );
        summary
    }

    /// Dial, ping and record. Any failure discards the probe; the next cycle retries.
    pub async fn probe_peer(&self, target: &str) -> bool {
        match tokio::time::timeout(self.probe_timeout, self.measure(target)).await {
            Ok(Ok(rtt)) => {
                log::debug!("RTT to {}: {}ns", target, rtt);
                self.rtt_store.record(target, rtt);
                true
            }
            Ok(Err(e)) => {
                log::debug!("Probe to {} failed: {:?}", target, e);
                false
            }
            Err(_) => {
                log::debug!("Probe to {} timed out after {:?}", target, self.probe_timeout);
                false
            }
        }
    }

    async fn measure(&self, target: &str) -> Result<i64> {
        let addr = self.peer_addr(target);
        let mut client = PeerClient::connect(&addr, self.connect_timeout, self.max_frame_len).await?;
        let start = Instant::now();
        client.ping(&self.node_id, target).await?;
        let elapsed = start.elapsed();
        Ok(i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX))
    }

    /// Runs a cycle every `probe_interval`, first one interval after start.
    /// Cycles are spawned, so a slow cycle never delays the next tick.
    pub async fn run(self: Arc<Self>, probe_interval: Duration) {
        let mut ticker = periodic(probe_interval, false);
        loop {
            ticker.tick().await;
            let prober = Arc::clone(&self);
            tokio::spawn(async move {
                prober.probe_cycle().await;
            });
        }
    }
}
