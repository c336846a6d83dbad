use bytes::Bytes;

use crate::common::message::{
    AgentRequest, AgentResponse, RpcError, decode_message, encode_message,
};
use crate::handler::{
    context::HandlerContext, ping::handle_ping_request,
    rtt_matrix::handle_get_rtt_matrix_request,
};

/// Decode one request frame and route it to its handler. Malformed input is
/// answered with an `InvalidArgument` error response rather than failing the
/// connection.
pub fn dispatch_request(frame: &[u8], handler_ctx: &HandlerContext) -> AgentResponse {
    let request: AgentRequest = match decode_message(frame) {
        Ok(req) => req,
        Err(e) => {
            log::warn!("Failed to decode request frame ({} bytes): {:?}", frame.len(), e);
            return AgentResponse::Error(RpcError::invalid_argument(format!(
                "malformed request: {}",
                e
            )));
        }
    };

    match request {
        AgentRequest::Ping(ref req) => {
            log::debug!("Ping Request");
            match handle_ping_request(req, handler_ctx) {
                Ok(pong) => AgentResponse::Pong(pong),
                Err(e) => {
                    log::warn!("Rejected ping: {}", e);
                    AgentResponse::Error(e)
                }
            }
        }
        AgentRequest::GetRttMatrix => {
            log::debug!("GetRttMatrix Request");
            AgentResponse::RttMatrix(handle_get_rtt_matrix_request(handler_ctx))
        }
    }
}

/// Main entry point: dispatch a frame and encode the response.
pub fn dispatch_frame(frame: Bytes, handler_ctx: &HandlerContext) -> anyhow::Result<Bytes> {
    let response = dispatch_request(&frame, handler_ctx);
    Ok(Bytes::from(encode_message(&response)?))
}
