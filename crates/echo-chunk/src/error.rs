use std::io;

use thiserror::Error;

/// Errors produced while chunking or reading files.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The file could not be opened or read; no partial descriptor is returned.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience alias used throughout the chunk crate.
pub type Result<T> = std::result::Result<T, ChunkError>;
