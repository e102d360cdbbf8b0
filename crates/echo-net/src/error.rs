use std::io;

use thiserror::Error;

use echo_protocol::ProtocolError;

/// Errors produced by the connection registry.
#[derive(Debug, Error)]
pub enum NetError {
    /// Socket I/O failure; fatal for the session it occurred on.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Frame-level failure (suspect length header, bad encode).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Username is not in the peer table.
    #[error("peer not found: {0}")]
    PeerNotFound(String),

    /// Only reader peers accept connections.
    #[error("peer is not a reader: {0}")]
    NotAReader(String),

    /// The peer has not advertised a TCP port yet.
    #[error("peer does not advertise a TCP port yet: {0}")]
    PortUnknown(String),
}

/// Convenience alias used throughout the net crate.
pub type Result<T> = std::result::Result<T, NetError>;
