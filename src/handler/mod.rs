pub mod context;
pub mod ping;
pub mod rtt_matrix;
