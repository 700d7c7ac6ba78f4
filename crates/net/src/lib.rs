//! Relay networking for gridhaven.
//!
//! The relay holds no game state: the server tags connections with ids and
//! fans messages out; the client keeps a persistent connection alive on its
//! own thread and exposes two queues to the frame loop.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::*;
pub use protocol::*;
pub use server::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("relay client is not running")]
    Stopped,
    #[error("outbound queue full")]
    QueueFull,
}
