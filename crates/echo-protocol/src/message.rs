use echo_types::ChunkDigest;

/// Largest accepted frame: tag byte plus payload.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// All message types in the Echo sync protocol.
///
/// `FileDesc`, `PutChunk`, and `OpenNotepad` flow writer → reader;
/// `GetChunks` flows reader → writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Announce a file revision: the full descriptor.
    FileDesc {
        path: String,
        version: u64,
        size: u64,
        chunk_size: u32,
        hashes: Vec<ChunkDigest>,
    },
    /// Request the chunk indices missing locally.
    GetChunks { path: String, indices: Vec<u32> },
    /// Transfer one chunk's raw bytes.
    PutChunk {
        path: String,
        index: u32,
        data: Vec<u8>,
    },
    /// Tell readers to open their notepad viewer for the path.
    OpenNotepad { path: String },
}

impl Message {
    pub fn type_tag(&self) -> u8 {
        match self {
            Self::FileDesc { .. } => 1,
            Self::GetChunks { .. } => 2,
            Self::PutChunk { .. } => 3,
            Self::OpenNotepad { .. } => 4,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::FileDesc { .. } => "FileDesc",
            Self::GetChunks { .. } => "GetChunks",
            Self::PutChunk { .. } => "PutChunk",
            Self::OpenNotepad { .. } => "OpenNotepad",
        }
    }

    /// Path the message concerns. Every message carries one.
    pub fn path(&self) -> &str {
        match self {
            Self::FileDesc { path, .. }
            | Self::GetChunks { path, .. }
            | Self::PutChunk { path, .. }
            | Self::OpenNotepad { path } => path,
        }
    }
}
