use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::digest::ChunkDigest;

/// Default chunk size used when splitting files.
pub const DEFAULT_CHUNK_SIZE: u32 = 4096;

/// Descriptor for one revision of a synced file.
///
/// Invariants:
/// - `hashes.len() * chunk_size >= size` and the slack is less than one chunk
/// - every chunk except the last is exactly `chunk_size` bytes
/// - `hashes[i]` digests the i-th chunk's raw bytes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    /// Revision counter, bumped by exactly 1 on every writer commit.
    pub version: u64,
    /// File size in bytes.
    pub size: u64,
    /// Modification time, seconds since the Unix epoch.
    pub mtime: u64,
    /// Chunk size this descriptor was computed with.
    pub chunk_size: u32,
    /// Per-chunk digests, in file order.
    pub hashes: Vec<ChunkDigest>,
}

impl FileMeta {
    /// Number of chunks in this descriptor.
    pub fn chunk_count(&self) -> u32 {
        self.hashes.len() as u32
    }

    /// Number of chunks a file of `size` bytes occupies at `chunk_size`.
    pub fn chunks_for(size: u64, chunk_size: u32) -> u64 {
        debug_assert!(chunk_size > 0);
        size.div_ceil(u64::from(chunk_size))
    }

    /// Byte length of chunk `index` (the last chunk may be short).
    ///
    /// Returns `None` for an out-of-range index.
    pub fn chunk_len(&self, index: u32) -> Option<u64> {
        let n = self.hashes.len() as u64;
        let i = u64::from(index);
        if i >= n {
            return None;
        }
        let csz = u64::from(self.chunk_size);
        if i + 1 == n {
            Some(self.size - i * csz)
        } else {
            Some(csz)
        }
    }
}

/// Current wall-clock time as seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
