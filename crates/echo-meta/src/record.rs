use echo_types::{ChunkDigest, FileMeta};

/// A single WAL or snapshot record.
///
/// On-disk format, one record per line:
/// ```text
/// PUT|path|version|size|mtime|chunk_sz|h1,h2,...
/// DEL|path
/// ```
/// The hash field is a comma-separated list of hex digests and may be empty
/// (an empty file has no chunks).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
    Put { path: String, meta: FileMeta },
    Del { path: String },
}

impl Record {
    /// Render as one line, without the trailing newline.
    pub fn to_line(&self) -> String {
        match self {
            Self::Put { path, meta } => {
                let hashes = meta
                    .hashes
                    .iter()
                    .map(ChunkDigest::to_hex)
                    .collect::<Vec<_>>()
                    .join(",");
                format!(
                    "PUT|{}|{}|{}|{}|{}|{}",
                    path, meta.version, meta.size, meta.mtime, meta.chunk_size, hashes
                )
            }
            Self::Del { path } => format!("DEL|{path}"),
        }
    }

    /// Parse one line. Returns `None` for empty or malformed lines, which
    /// recovery skips.
    pub fn parse_line(line: &str) -> Option<Self> {
        if let Some(rest) = line.strip_prefix("PUT|") {
            let mut parts = rest.splitn(6, '|');
            let path = parts.next()?;
            let version = parts.next()?.parse().ok()?;
            let size = parts.next()?.parse().ok()?;
            let mtime = parts.next()?.parse().ok()?;
            let chunk_size: u32 = parts.next()?.parse().ok()?;
            let hash_csv = parts.next()?;
            if path.is_empty() || chunk_size == 0 {
                return None;
            }
            let mut hashes = Vec::new();
            if !hash_csv.is_empty() {
                for h in hash_csv.split(',') {
                    hashes.push(ChunkDigest::from_hex(h).ok()?);
                }
            }
            Some(Self::Put {
                path: path.to_string(),
                meta: FileMeta {
                    version,
                    size,
                    mtime,
                    chunk_size,
                    hashes,
                },
            })
        } else if let Some(path) = line.strip_prefix("DEL|") {
            if path.is_empty() {
                return None;
            }
            Some(Self::Del {
                path: path.to_string(),
            })
        } else {
            None
        }
    }
}

/// Whether a path can be framed in the record format. The separator and
/// line breaks would corrupt the line.
pub fn path_is_recordable(path: &str) -> bool {
    !path.is_empty() && !path.contains('|') && !path.contains('\n') && !path.contains('\r')
}
