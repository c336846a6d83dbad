#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::routing::post;
use axum::{Json, Router};
use cloud_edge_agent::common::config::AgentConfig;
use cloud_edge_agent::handler::context::HandlerContext;
use cloud_edge_agent::server::transport::serve;
use cloud_edge_agent::storage::rtt_store::RttStore;
use cloud_edge_agent::traits::stat_source::StatSource;
use serde_json::Value;
use tokio::net::TcpListener;

pub fn test_config(node_id: &str, peers: Vec<String>) -> AgentConfig {
    AgentConfig {
        node_id: node_id.to_string(),
        node_type: "edge".to_string(),
        listen_host: "127.0.0.1".to_string(),
        rpc_port: 0,
        peers,
        backend_url: "http://127.0.0.1:9".to_string(),
        heartbeat_interval: Duration::from_millis(100),
        probe_interval: Duration::from_millis(100),
        report_interval: Duration::from_millis(100),
        probe_connect_timeout: Duration::from_millis(500),
        probe_timeout: Duration::from_millis(500),
        max_frame_len: 64 * 1024,
    }
}

/// Starts a bare probe service for `node_id` and returns its address and table.
pub async fn spawn_probe_service(node_id: &str) -> (SocketAddr, Arc<RttStore>) {
    spawn_rtt_service_with_frame_len(node_id, 64 * 1024).await
}

pub async fn spawn_rtt_service_with_frame_len(node_id: &str, max_frame_len: usize) -> (SocketAddr, Arc<RttStore>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let store = Arc::new(RttStore::new(node_id));
    let ctx = HandlerContext::new(Arc::clone(&store));
    tokio::spawn(serve(listener, ctx, max_frame_len));
    (addr, store)
}

/// Accepts connections and never answers, holding them open.
pub async fn spawn_silent_peer() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[derive(Clone, Default)]
pub struct MockBackend {
    pub requests: Arc<Mutex<Vec<(String, Value)>>>,
    status: Arc<AtomicU16>,
}

impl MockBackend {
    pub fn set_status(&self, status: StatusCode) {
        self.status.store(status.as_u16(), Ordering::SeqCst);
    }

    pub fn bodies_for(&self, path: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

async fn record(State(backend): State<MockBackend>, uri: Uri, Json(body): Json<Value>) -> StatusCode {
    backend
        .requests
        .lock()
        .unwrap()
        .push((uri.path().to_string(), body));
    StatusCode::from_u16(backend.status.load(Ordering::SeqCst)).unwrap_or(StatusCode::OK)
}

/// Collector stand-in accepting RTT pushes and heartbeats. Returns its base URL.
pub async fn spawn_mock_backend() -> (String, MockBackend) {
    let backend = MockBackend::default();
    backend.set_status(StatusCode::OK);

    let app = Router::new()
        .route("/api/rtt", post(record))
        .route("/heartbeat", post(record))
        .with_state(backend.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), backend)
}

pub struct FixedStats;

impl StatSource for FixedStats {
    async fn cpu(&self) -> String {
        "cpu  100 0 50 850 0 0 0 0 0 0\n".to_string()
    }

    async fn memory(&self) -> String {
        "Mem:  8000 3000 2000 50 3000 4000\n".to_string()
    }

    async fn network(&self) -> String {
        "eth0: 1000 10 0 0 0 0 0 0 2000 20 0 0 0 0 0 0\n".to_string()
    }
}

pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
