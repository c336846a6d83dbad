use crate::common::message::RttMatrixResponse;
use crate::handler::context::HandlerContext;

pub fn handle_get_rtt_matrix_request(handler_ctx: &HandlerContext) -> RttMatrixResponse {
    let matrix = handler_ctx.rtt_store.snapshot();
    log::debug!(
        "GetRttMatrix: {} sources, {} entries",
        matrix.nodes.len(),
        matrix.entries.len()
    );
    matrix
}
