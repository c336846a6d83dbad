use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use crate::common::config::{AgentConfig, load_agent_config};
use crate::handler::context::HandlerContext;
use crate::server::heartbeat::Heartbeat;
use crate::server::prober::Prober;
use crate::server::reporter::Reporter;
use crate::server::transport::serve;
use crate::stats::proc_stat_source::ProcStatSource;
use crate::storage::rtt_store::RttStore;
use crate::traits::stat_source::StatSource;

const BACKEND_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn agent_start() -> Result<()> {
    let config = load_agent_config()?;
    log::info!(
        "Starting agent: node_id={}, node_type={}, backend={}, peers={:?}",
        config.node_id, config.node_type, config.backend_url, config.peers
    );
    let agent = Agent::bind(config).await?;
    agent.run(ProcStatSource::new()).await
}

/// A bound agent: probe service listener plus the shared RTT table.
pub struct Agent {
    config: AgentConfig,
    listener: TcpListener,
    rtt_store: Arc<RttStore>,
}

impl Agent {
    /// Binding failure is fatal: an agent that cannot serve has no degraded mode.
    pub async fn bind(config: AgentConfig) -> Result<Self> {
        let listen_addr = config.listen_addr();
        let listener = TcpListener::bind(&listen_addr)
            .await
            .with_context(|| format!("failed to listen on {}", listen_addr))?;
        log::info!("Probe service listening on {}", listener.local_addr()?);
        let rtt_store = Arc::new(RttStore::new(config.node_id.clone()));
        Ok(Self {
            config,
            listener,
            rtt_store,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn rtt_store(&self) -> Arc<RttStore> {
        Arc::clone(&self.rtt_store)
    }

    /// Serves probes and drives the prober, reporter and heartbeat until the
    /// process exits. Returns only if the accept loop fails.
    pub async fn run<S>(self, stats: S) -> Result<()>
    where
        S: StatSource + Send + Sync + 'static,
    {
        let http = reqwest::Client::builder()
            .timeout(BACKEND_HTTP_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        let prober = Arc::new(Prober::new(&self.config, self.rtt_store()));
        tokio::spawn(prober.run(self.config.probe_interval));

        let reporter = Reporter::new(&self.config.backend_url, http.clone(), self.rtt_store());
        tokio::spawn(reporter.run(self.config.report_interval));

        let heartbeat = Heartbeat::new(&self.config, http, stats);
        tokio::spawn(heartbeat.run(self.config.heartbeat_interval));

        log::info!(
            "Agent {} running: probe every {:?}, report every {:?}, heartbeat every {:?}",
            self.config.node_id,
            self.config.probe_interval,
            self.config.report_interval,
            self.config.heartbeat_interval
        );
        let handler_ctx = HandlerContext::new(self.rtt_store());
        serve(self.listener, handler_ctx, self.config.max_frame_len).await
    }
}
