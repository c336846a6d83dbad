use cloud_edge_agent::agent_start;
use cloud_edge_agent::common::config::load_agent_config;
use cloud_edge_agent::server::peer_client::query_rtt_matrix;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let query_addr = args
        .windows(2)
        .find(|w| w[0] == "--query-matrix")
        .map(|w| w[1].clone());

    match query_addr {
        Some(addr) => query_matrix(&addr).await,
        None => agent_start().await,
    }
}

/// Debug aid: dump a running agent's RTT matrix as JSON.
async fn query_matrix(addr: &str) -> anyhow::Result<()> {
    let config = load_agent_config()?;
    let matrix = query_rtt_matrix(addr, &config).await?;
    println!("{}", serde_json::to_string_pretty(&matrix)?);
    Ok(())
}
