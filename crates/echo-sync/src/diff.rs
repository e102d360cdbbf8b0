use echo_types::ChunkDigest;

/// Chunk indices a local descriptor is missing relative to a remote one.
///
/// An index is missing when it lies beyond the local hash list or the
/// digests differ. With no local descriptor every index is missing. The
/// result drives `GET_CHUNKS`, so its cardinality is exactly the number of
/// `PUT_CHUNK` frames a correct writer will answer with.
pub fn missing_indices(local: Option<&[ChunkDigest]>, remote: &[ChunkDigest]) -> Vec<u32> {
    match local {
        None => (0..remote.len() as u32).collect(),
        Some(local) => remote
            .iter()
            .enumerate()
            .filter(|(i, h)| *i >= local.len() || local[*i] != **h)
            .map(|(i, _)| i as u32)
            .collect(),
    }
}
