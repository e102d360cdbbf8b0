use std::io;

use thiserror::Error;

/// Errors produced by the discovery service.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Socket setup or send/receive failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience alias used throughout the discovery crate.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
