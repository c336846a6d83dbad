use std::sync::Arc;

use crate::storage::rtt_store::RttStore;

#[derive(Clone)]
pub struct HandlerContext {
    pub node_id: Arc<str>,
    pub rtt_store: Arc<RttStore>,
}

impl HandlerContext {
    pub fn new(rtt_store: Arc<RttStore>) -> Self {
        Self {
            node_id: Arc::from(rtt_store.node_id()),
            rtt_store,
        }
    }
}
