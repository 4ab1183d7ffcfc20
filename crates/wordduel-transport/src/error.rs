use std::net::SocketAddr;

use crate::ConnectionId;

/// Errors raised while listening for or talking to a client socket.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to accept tcp connection: {0}")]
    Accept(#[source] std::io::Error),

    /// The TCP connection was accepted but never became a WebSocket.
    #[error("websocket handshake with {peer} failed: {reason}")]
    Handshake { peer: SocketAddr, reason: String },

    #[error("send to {0} failed: {1}")]
    Send(ConnectionId, String),

    #[error("receive from {0} failed: {1}")]
    Receive(ConnectionId, String),

    #[error("{0} closed: {1}")]
    Closed(ConnectionId, String),
}

impl TransportError {
    /// Whether the error concerns a single client rather than the listener.
    ///
    /// The accept loop keeps going after a per-client failure.
    pub fn is_per_client(&self) -> bool {
        !matches!(self, Self::Bind { .. })
    }
}
