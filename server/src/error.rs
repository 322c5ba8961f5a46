//! Error types for the server's I/O edges.
//!
//! Game logic never fails: malformed or out-of-turn commands are ignored.
//! Only sockets and the wire codec produce errors.

use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias using [`ServerError`].
pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The UDP socket could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Sending or receiving on the socket failed.
    #[error("Socket error: {0}")]
    Io(#[from] std::io::Error),

    /// A packet could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// A datagram exceeded what a single UDP packet can carry.
    #[error("Packet of {size} bytes for {addr} exceeds the datagram limit")]
    Oversized { addr: SocketAddr, size: usize },
}
