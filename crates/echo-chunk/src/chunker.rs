use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::UNIX_EPOCH;

use tracing::debug;

use echo_types::{unix_now, ChunkDigest, FileMeta};

use crate::error::Result;

/// Compute the descriptor for a file at `path`.
///
/// The file is read sequentially, one chunk at a time; every chunk except
/// the last is exactly `chunk_size` bytes, and each digest covers the raw
/// bytes actually read. `size` and `mtime` come from file metadata.
///
/// The `version` field is left at 0; the caller fills it (writer: prior
/// version + 1, or 1 if absent). An empty file yields an empty hash list.
pub fn describe(path: &Path, chunk_size: u32) -> Result<FileMeta> {
    let mut file = File::open(path)?;
    let stat = file.metadata()?;
    let size = stat.len();
    let mtime = stat
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or_else(unix_now, |d| d.as_secs());

    let mut hashes = Vec::with_capacity(FileMeta::chunks_for(size, chunk_size) as usize);
    let mut buf = vec![0u8; chunk_size as usize];
    loop {
        let n = read_up_to(&mut file, &mut buf)?;
        if n == 0 {
            break;
        }
        hashes.push(ChunkDigest::of(&buf[..n]));
        if n < buf.len() {
            break;
        }
    }

    debug!(path = %path.display(), size, chunks = hashes.len(), "described file");
    Ok(FileMeta {
        version: 0,
        size,
        mtime,
        chunk_size,
        hashes,
    })
}

/// Read chunk `index` of the file at `path`.
///
/// Returns the chunk's raw bytes (short at end of file) or `None` when the
/// index lies entirely past the end.
pub fn read_chunk(path: &Path, index: u32, chunk_size: u32) -> Result<Option<Vec<u8>>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(u64::from(index) * u64::from(chunk_size)))?;
    let mut buf = vec![0u8; chunk_size as usize];
    let n = read_up_to(&mut file, &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    buf.truncate(n);
    Ok(Some(buf))
}

/// Read until `buf` is full or end of file; returns the byte count.
fn read_up_to(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut got = 0;
    while got < buf.len() {
        let n = file.read(&mut buf[got..])?;
        if n == 0 {
            break;
        }
        got += n;
    }
    Ok(got)
}
