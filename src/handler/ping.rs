use crate::common::message::{PingRequest, PongResponse, RpcError};
use crate::common::utils::now_nanos;
use crate::handler::context::HandlerContext;

/// Echoes the ping with the local timestamp. The caller computes and records
/// the RTT; the responder never touches the store.
pub fn handle_ping_request(
    request: &PingRequest,
    handler_ctx: &HandlerContext,
) -> Result<PongResponse, RpcError> {
    if request.source_id.is_empty() {
        return Err(RpcError::invalid_argument("ping is missing source_id"));
    }
    if request.destination_id.is_empty() {
        return Err(RpcError::invalid_argument("ping is missing destination_id"));
    }
    log::debug!(
        "Ping from {} to {} (sent at {})",
        request.source_id, request.destination_id, request.send_timestamp
    );

    Ok(PongResponse {
        responder_id: handler_ctx.node_id.to_string(),
        original_sender_id: request.source_id.clone(),
        send_timestamp: request.send_timestamp,
        responder_timestamp: now_nanos(),
    })
}
