//! Durable metadata store for Echo.
//!
//! Maps file paths to [`FileMeta`](echo_types::FileMeta) descriptors. The
//! in-memory map is backed by two line-delimited text files:
//!
//! - a **snapshot** holding `PUT` records for every live entry at the time
//!   it was written, and
//! - an append-only **WAL** of `PUT`/`DEL` records applied since.
//!
//! Recovery reads the snapshot and then replays the WAL; later records win
//! and `DEL` erases. Every successful mutation is fsync-durable before it
//! returns. When the WAL grows past a threshold the store compacts: current
//! entries are written to a temp file, renamed over the snapshot (atomic on
//! POSIX), and the WAL is truncated. A crash between rename and truncate is
//! harmless because WAL replay is last-write-wins per path.

pub mod error;
pub mod record;
pub mod store;

pub use error::{Result, StoreError};
pub use record::Record;
pub use store::{MetadataStore, StoreConfig};
