#![allow(clippy::async_fn_in_trait)]
pub mod common;
pub mod handler;
pub mod server;
pub mod stats;
pub mod storage;
pub mod traits;

pub use server::server::{Agent, agent_start};
