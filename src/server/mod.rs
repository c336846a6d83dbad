pub mod dispatch;
pub mod heartbeat;
pub mod peer_client;
pub mod prober;
pub mod reporter;
pub mod server;
pub mod transport;
