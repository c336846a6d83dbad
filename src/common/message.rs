use anyhow::Result;
use bincode::config;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct PingRequest {
    pub source_id: String,
    pub destination_id: String,
    pub send_timestamp: i64, // ns since UNIX_EPOCH
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct PongResponse {
    pub responder_id: String,
    pub original_sender_id: String,
    pub send_timestamp: i64,
    pub responder_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct RttEntry {
    pub source: String,
    pub destination: String,
    pub rtt: i64, // ns
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct RttMatrixResponse {
    pub nodes: Vec<String>,
    pub entries: Vec<RttEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum ErrorCode {
    InvalidArgument,
}

/// Protocol-level failure reported by the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidArgument,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum AgentRequest {
    Ping(PingRequest),
    GetRttMatrix,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum AgentResponse {
    Pong(PongResponse),
    RttMatrix(RttMatrixResponse),
    Error(RpcError),
}

/// Upper bound on bytes a single decoded message may claim. Length prefixes are
/// checked against it before anything is allocated; `MAX_FRAME_LEN` may not exceed it.
pub const MAX_MESSAGE_LEN: usize = 16 * 1024 * 1024;

pub fn encode_message<T: Encode>(message: &T) -> Result<Vec<u8>> {
    Ok(bincode::encode_to_vec(message, config::standard())?)
}

/// Decodes one frame. Trailing bytes are treated as a malformed frame.
pub fn decode_message<T: Decode<()>>(frame: &[u8]) -> Result<T> {
    let limited = config::standard().with_limit::<MAX_MESSAGE_LEN>();
    let (message, len): (T, usize) = bincode::decode_from_slice(frame, limited)?;
    if len != frame.len() {
        anyhow::bail!("{} trailing bytes after message", frame.len() - len);
    }
    Ok(message)
}
