use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::common::config::AgentConfig;
use crate::common::message::{
    AgentRequest, AgentResponse, PingRequest, PongResponse, RttMatrixResponse, decode_message,
    encode_message,
};
use crate::common::utils::now_nanos;
use crate::server::transport::new_codec;

/// One dialed connection to a peer's probe service. Not pooled: probes dial a
/// fresh client every cycle and drop it afterwards.
pub struct PeerClient {
    framed: Framed<TcpStream, LengthDelimitedCodec>,
    addr: String,
}

impl PeerClient {
    pub async fn connect(addr: &str, connect_timeout: Duration, max_frame_len: usize) -> Result<Self> {
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .with_context(|| format!("connect to {} timed out", addr))?
            .with_context(|| format!("failed to connect to {}", addr))?;
        stream.set_nodelay(true)?;
        Ok(Self {
            framed: Framed::new(stream, new_codec(max_frame_len)),
            addr: addr.to_string(),
        })
    }

    pub async fn ping(&mut self, source_id: &str, destination_id: &str) -> Result<PongResponse> {
        let request = AgentRequest::Ping(PingRequest {
            source_id: source_id.to_string(),
            destination_id: destination_id.to_string(),
            send_timestamp: now_nanos(),
        });
        match self.call(&request).await? {
            AgentResponse::Pong(pong) => Ok(pong),
            other => Err(unexpected(&self.addr, other)),
        }
    }

    pub async fn get_rtt_matrix(&mut self) -> Result<RttMatrixResponse> {
        match self.call(&AgentRequest::GetRttMatrix).await? {
            AgentResponse::RttMatrix(matrix) => Ok(matrix),
            other => Err(unexpected(&self.addr, other)),
        }
    }

    /// Sends one raw frame and returns the decoded reply. Exposed for exercising
    /// the server with malformed input.
    pub async fn call_raw(&mut self, frame: Bytes) -> Result<AgentResponse> {
        self.framed
            .send(frame)
            .await
            .with_context(|| format!("failed to send request to {}", self.addr))?;
        let reply = self
            .framed
            .next()
            .await
            .with_context(|| format!("{} closed the connection", self.addr))?
            .with_context(|| format!("failed to read response from {}", self.addr))?;
        decode_message(&reply)
    }

    async fn call(&mut self, request: &AgentRequest) -> Result<AgentResponse> {
        let frame = Bytes::from(encode_message(request)?);
        self.call_raw(frame).await
    }
}

/// One-shot matrix fetch using the configured timeouts and frame bound.
pub async fn query_rtt_matrix(addr: &str, config: &AgentConfig) -> Result<RttMatrixResponse> {
    let mut client = PeerClient::connect(addr, config.probe_connect_timeout, config.max_frame_len).await?;
    tokio::time::timeout(config.probe_timeout, client.get_rtt_matrix())
        .await
        .with_context(|| format!("matrix query to {} timed out", addr))?
}

fn unexpected(addr: &str, response: AgentResponse) -> anyhow::Error {
    match response {
        AgentResponse::Error(e) => anyhow::Error::new(e).context(format!("{} rejected the request", addr)),
        other => anyhow::anyhow!("unexpected response from {}: {:?}", addr, other),
    }
}
