//! Fixed-size chunking for Echo.
//!
//! [`describe`] splits a file into `chunk_size`-byte chunks and digests each
//! one, producing the [`FileMeta`](echo_types::FileMeta) descriptor the sync
//! protocol announces. [`read_chunk`] is the positioned read the writer side
//! uses to serve chunk requests.

pub mod chunker;
pub mod error;

pub use chunker::{describe, read_chunk};
pub use error::{ChunkError, Result};
