mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use cloud_edge_agent::server::reporter::Reporter;
use cloud_edge_agent::storage::rtt_store::RttStore;
use common::{spawn_mock_backend, unreachable_addr, wait_until};
use serde_json::json;

#[tokio::test]
async fn pushes_local_vector_as_json() {
    let (url, backend) = spawn_mock_backend().await;
    let store = Arc::new(RttStore::new("node-a"));
    store.record("node-b", 5_000_000);
    let reporter = Reporter::new(&url, reqwest::Client::new(), Arc::clone(&store));
    assert_eq!(reporter.endpoint(), format!("{}/api/rtt", url));

    reporter.report_once().await.unwrap();
    assert_eq!(backend.bodies_for("/api/rtt"), vec![json!({ "node-b": 5_000_000 })]);
}

#[tokio::test]
async fn empty_vector_is_still_pushed() {
    let (url, backend) = spawn_mock_backend().await;
    let reporter = Reporter::new(&url, reqwest::Client::new(), Arc::new(RttStore::new("node-a")));

    reporter.report_once().await.unwrap();
    assert_eq!(backend.bodies_for("/api/rtt"), vec![json!({})]);
}

#[tokio::test]
async fn non_success_status_is_dropped_and_next_push_carries_current_vector() {
    let (url, backend) = spawn_mock_backend().await;
    backend.set_status(StatusCode::SERVICE_UNAVAILABLE);
    let store = Arc::new(RttStore::new("node-a"));
    store.record("node-b", 5_000_000);
    let reporter = Reporter::new(&url, reqwest::Client::new(), Arc::clone(&store));

    assert!(reporter.report_once().await.is_err());

    backend.set_status(StatusCode::OK);
    store.record("node-b", 6_000_000);
    reporter.report_once().await.unwrap();

    let bodies = backend.bodies_for("/api/rtt");
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[1], json!({ "node-b": 6_000_000 }));
}

#[tokio::test]
async fn unreachable_backend_is_an_error_not_a_panic() {
    let url = format!("http://{}", unreachable_addr().await);
    let reporter = Reporter::new(&url, reqwest::Client::new(), Arc::new(RttStore::new("node-a")));
    assert!(reporter.report_once().await.is_err());
}

#[tokio::test]
async fn run_keeps_pushing_after_failures() {
    let (url, backend) = spawn_mock_backend().await;
    backend.set_status(StatusCode::INTERNAL_SERVER_ERROR);
    let store = Arc::new(RttStore::new("node-a"));
    store.record("node-b", 1);
    let reporter = Reporter::new(&url, reqwest::Client::new(), Arc::clone(&store));
    tokio::spawn(reporter.run(Duration::from_millis(30)));

    assert!(wait_until(Duration::from_secs(3), || backend.bodies_for("/api/rtt").len() >= 3).await);
}
