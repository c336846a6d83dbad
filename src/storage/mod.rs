pub mod rtt_store;
