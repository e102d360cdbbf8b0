use std::io;

use thiserror::Error;

use echo_chunk::ChunkError;
use echo_meta::StoreError;
use echo_net::NetError;

/// Errors produced by the sync engine.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("chunk error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("net error: {0}")]
    Net(#[from] NetError),

    /// A peer-supplied path escapes the sync root.
    #[error("unsafe path: {0:?}")]
    UnsafePath(String),
}

/// Convenience alias used throughout the sync crate.
pub type Result<T> = std::result::Result<T, SyncError>;
