use std::io;

use thiserror::Error;

/// Errors produced by the metadata store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error on the WAL, snapshot, or during compaction.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The path cannot be framed in the record format.
    #[error("path not representable in store records: {0:?}")]
    InvalidPath(String),
}

/// Convenience alias used throughout the store crate.
pub type Result<T> = std::result::Result<T, StoreError>;
