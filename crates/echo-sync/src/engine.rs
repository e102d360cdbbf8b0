use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use echo_meta::MetadataStore;
use echo_net::{FrameHandler, Session, SessionRegistry};
use echo_protocol::Message;
use echo_types::{unix_now, ChunkDigest, FileMeta, DEFAULT_CHUNK_SIZE};

use crate::diff::missing_indices;
use crate::error::{Result, SyncError};
use crate::hooks::NotepadHooks;

/// Configuration for the sync engine.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Directory synced files live under; peer paths resolve against it.
    pub root: PathBuf,
    /// Chunk size used for locally committed revisions.
    pub chunk_size: u32,
    /// Verify each incoming chunk against the announced digest and
    /// re-request on mismatch.
    pub verify_chunks: bool,
}

impl SyncConfig {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            chunk_size: DEFAULT_CHUNK_SIZE,
            verify_chunks: true,
        }
    }
}

/// Transfer in progress for one path.
///
/// `received` starts at the number of chunks carried over from the local
/// copy (the staging file is seeded with it), so `received == total` is
/// the finalize condition even for partial transfers.
struct ReceiveState {
    total: u32,
    received: u32,
    chunk_size: u32,
    size: u64,
    expected: Vec<ChunkDigest>,
}

/// Drives both sides of the sync protocol.
///
/// Owns no sockets and no descriptor map — it borrows the registry and the
/// store — but it does own the per-path [`ReceiveState`] table. The table
/// mutex also serializes staging writes and the finalize rename per path.
pub struct SyncEngine {
    config: SyncConfig,
    store: Arc<MetadataStore>,
    registry: Arc<SessionRegistry>,
    hooks: Arc<dyn NotepadHooks>,
    recv_states: Mutex<HashMap<String, ReceiveState>>,
    current_notepad: Mutex<Option<String>>,
}

impl SyncEngine {
    pub fn new(
        config: SyncConfig,
        store: Arc<MetadataStore>,
        registry: Arc<SessionRegistry>,
        hooks: Arc<dyn NotepadHooks>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            registry,
            hooks,
            recv_states: Mutex::new(HashMap::new()),
            current_notepad: Mutex::new(None),
        })
    }

    // ---- writer side ----

    /// Commit the current contents of `path`: describe, bump the version,
    /// store durably, broadcast the descriptor to every open session.
    pub fn commit(&self, path: &str) -> Result<FileMeta> {
        let full = self.safe_join(path)?;
        let mut meta = echo_chunk::describe(&full, self.config.chunk_size)?;
        meta.version = self.store.get(path).map_or(1, |m| m.version + 1);
        self.store.put(path, meta.clone())?;
        self.registry.broadcast(&Self::file_desc(path, &meta));
        info!(
            path,
            version = meta.version,
            chunks = meta.hashes.len(),
            "revision published"
        );
        Ok(meta)
    }

    /// Mark `path` as the open notepad, tell every reader to open its
    /// viewer, and announce the current content.
    pub fn open_notepad(&self, path: &str) -> Result<FileMeta> {
        {
            let mut current = self.current_notepad.lock().expect("notepad mutex poisoned");
            *current = Some(path.to_string());
        }
        self.registry.broadcast(&Message::OpenNotepad {
            path: path.to_string(),
        });
        self.commit(path)
    }

    pub fn close_notepad(&self) {
        let mut current = self.current_notepad.lock().expect("notepad mutex poisoned");
        *current = None;
    }

    pub fn current_notepad(&self) -> Option<String> {
        self.current_notepad
            .lock()
            .expect("notepad mutex poisoned")
            .clone()
    }

    /// Bootstrap a freshly dialed session: if a notepad is open, send
    /// `OPEN_NOTEPAD` and the current descriptor so a late-joining reader
    /// converges without waiting for the next local commit.
    pub fn announce_current_to(&self, session: &Arc<Session>) {
        let Some(path) = self.current_notepad() else {
            return;
        };
        if let Err(e) = session.send(&Message::OpenNotepad { path: path.clone() }) {
            warn!(peer = session.key(), error = %e, "notepad announcement failed");
            return;
        }
        if let Some(meta) = self.store.get(&path) {
            if let Err(e) = session.send(&Self::file_desc(&path, &meta)) {
                warn!(peer = session.key(), error = %e, "descriptor announcement failed");
            }
        }
    }

    /// Serve a chunk request: one `PUT_CHUNK` per readable index.
    /// Out-of-range indices and unknown paths are silently skipped.
    fn handle_get_chunks(&self, session: &Arc<Session>, path: String, indices: Vec<u32>) {
        let Ok(full) = self.safe_join(&path) else {
            warn!(path, "unsafe path in chunk request");
            return;
        };
        let chunk_size = self
            .store
            .get(&path)
            .map_or(self.config.chunk_size, |m| m.chunk_size);
        for index in indices {
            match echo_chunk::read_chunk(&full, index, chunk_size) {
                Ok(Some(data)) => {
                    let reply = Message::PutChunk {
                        path: path.clone(),
                        index,
                        data,
                    };
                    if let Err(e) = session.send(&reply) {
                        warn!(peer = session.key(), error = %e, "chunk send failed");
                        return;
                    }
                }
                Ok(None) => debug!(path, index, "requested index out of range, skipping"),
                Err(e) => {
                    debug!(path, error = %e, "cannot serve chunk request, dropping");
                    return;
                }
            }
        }
    }

    // ---- reader side ----

    /// Diff an announced descriptor against local state and request what
    /// is missing.
    fn handle_file_desc(
        &self,
        session: &Arc<Session>,
        path: String,
        version: u64,
        size: u64,
        chunk_size: u32,
        hashes: Vec<ChunkDigest>,
    ) {
        let Ok(full) = self.safe_join(&path) else {
            warn!(path, "unsafe path in descriptor");
            return;
        };
        if chunk_size == 0 {
            warn!(path, "descriptor with zero chunk size, dropping");
            return;
        }
        let staging = staging_path(&full);

        // Empty revision: no chunks will flow; materialize via staging.
        if hashes.is_empty() {
            if let Err(e) = self.apply_empty(&path, &full, &staging, version, chunk_size) {
                warn!(path, error = %e, "failed to apply empty revision");
            }
            return;
        }

        let local = if full.exists() { self.store.get(&path) } else { None };
        let missing = missing_indices(local.as_ref().map(|m| m.hashes.as_slice()), &hashes);

        if missing.is_empty() {
            let local_version = local.as_ref().map_or(0, |m| m.version);
            if version > local_version {
                let meta = FileMeta {
                    version,
                    size,
                    mtime: unix_now(),
                    chunk_size,
                    hashes,
                };
                if let Err(e) = self.store.put(&path, meta) {
                    warn!(path, error = %e, "descriptor store failed");
                }
            }
            self.recv_states
                .lock()
                .expect("recv-state mutex poisoned")
                .remove(&path);
            return;
        }

        // Seed the staging file from the local copy so unchanged chunks
        // carry over. A newer descriptor supersedes any in-flight transfer.
        if let Err(e) = seed_staging(&full, &staging) {
            warn!(path, error = %e, "staging setup failed");
            return;
        }
        let total = hashes.len() as u32;
        let state = ReceiveState {
            total,
            received: total - missing.len() as u32,
            chunk_size,
            size,
            expected: hashes,
        };
        self.recv_states
            .lock()
            .expect("recv-state mutex poisoned")
            .insert(path.clone(), state);

        debug!(path, missing = missing.len(), total, "requesting chunks");
        if let Err(e) = session.send(&Message::GetChunks {
            path,
            indices: missing,
        }) {
            warn!(peer = session.key(), error = %e, "chunk request failed");
        }
    }

    /// Store one received chunk; finalize the transfer when the last
    /// expected chunk lands.
    fn handle_put_chunk(&self, session: &Arc<Session>, path: String, index: u32, data: Vec<u8>) {
        let Ok(full) = self.safe_join(&path) else {
            warn!(path, "unsafe path in chunk transfer");
            return;
        };

        let mut states = self.recv_states.lock().expect("recv-state mutex poisoned");
        let Some(state) = states.get_mut(&path) else {
            debug!(path, index, "chunk with no receive state, dropping");
            return;
        };
        if index >= state.total {
            debug!(path, index, "chunk index out of range, dropping");
            return;
        }
        if self.config.verify_chunks && ChunkDigest::of(&data) != state.expected[index as usize] {
            warn!(path, index, "chunk digest mismatch, re-requesting");
            let _ = session.send(&Message::GetChunks {
                path: path.clone(),
                indices: vec![index],
            });
            return;
        }

        let staging = staging_path(&full);
        if let Err(e) = write_chunk(&staging, index, state.chunk_size, &data) {
            warn!(path, index, error = %e, "staging write failed");
            return;
        }
        state.received += 1;
        debug!(
            path,
            index,
            received = state.received,
            total = state.total,
            "chunk stored"
        );

        if state.received >= state.total {
            let size = state.size;
            let chunk_size = state.chunk_size;
            let expected = state.expected.clone();
            states.remove(&path);
            // The state lock is still held: the rename cannot interleave
            // with another chunk write for this path.
            if let Err(e) = self.finalize(&path, &full, &staging, size, chunk_size, expected) {
                warn!(path, error = %e, "finalize failed");
            }
        }
    }

    /// Write an empty staging file, swap it in, adopt the descriptor.
    fn apply_empty(
        &self,
        path: &str,
        full: &Path,
        staging: &Path,
        version: u64,
        chunk_size: u32,
    ) -> Result<()> {
        ensure_parent(full)?;
        File::create(staging)?;
        fs::rename(staging, full)?;
        self.recv_states
            .lock()
            .expect("recv-state mutex poisoned")
            .remove(path);
        self.store.put(
            path,
            FileMeta {
                version: version.max(1),
                size: 0,
                mtime: unix_now(),
                chunk_size,
                hashes: vec![],
            },
        )?;
        info!(path, "empty revision applied");
        Ok(())
    }

    /// Atomically swap the staging file in and record the new descriptor.
    fn finalize(
        &self,
        path: &str,
        full: &Path,
        staging: &Path,
        size: u64,
        chunk_size: u32,
        expected: Vec<ChunkDigest>,
    ) -> Result<()> {
        {
            // A shrinking revision leaves stale bytes past the new end.
            let f = OpenOptions::new().write(true).open(staging)?;
            f.set_len(size)?;
            f.sync_all()?;
        }
        fs::rename(staging, full)?;

        let version = self.store.get(path).map_or(1, |m| m.version + 1);
        self.store.put(
            path,
            FileMeta {
                version,
                size,
                mtime: unix_now(),
                chunk_size,
                hashes: expected,
            },
        )?;
        info!(path, version, size, "transfer finalized");
        Ok(())
    }

    /// Resolve a peer-supplied relative path under the sync root,
    /// rejecting anything that would escape it.
    fn safe_join(&self, path: &str) -> Result<PathBuf> {
        let rel = Path::new(path);
        let safe = !path.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if safe {
            Ok(self.config.root.join(rel))
        } else {
            Err(SyncError::UnsafePath(path.to_string()))
        }
    }

    fn file_desc(path: &str, meta: &FileMeta) -> Message {
        Message::FileDesc {
            path: path.to_string(),
            version: meta.version,
            size: meta.size,
            chunk_size: meta.chunk_size,
            hashes: meta.hashes.clone(),
        }
    }
}

impl FrameHandler for SyncEngine {
    fn on_message(&self, session: &Arc<Session>, msg: Message) {
        match msg {
            Message::FileDesc {
                path,
                version,
                size,
                chunk_size,
                hashes,
            } => self.handle_file_desc(session, path, version, size, chunk_size, hashes),
            Message::GetChunks { path, indices } => self.handle_get_chunks(session, path, indices),
            Message::PutChunk { path, index, data } => {
                self.handle_put_chunk(session, path, index, data)
            }
            Message::OpenNotepad { path } => {
                if self.safe_join(&path).is_ok() {
                    debug!(path, "notepad announced");
                    self.hooks.on_open_notepad(&path);
                } else {
                    warn!(path, "unsafe path in notepad announcement");
                }
            }
        }
    }
}

fn staging_path(full: &Path) -> PathBuf {
    let mut os = full.as_os_str().to_os_string();
    os.push(".part");
    PathBuf::from(os)
}

fn ensure_parent(full: &Path) -> std::io::Result<()> {
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Copy the local file over the staging file (unchanged chunks carry
/// over); with no local copy, start from an empty staging file.
fn seed_staging(full: &Path, staging: &Path) -> std::io::Result<()> {
    ensure_parent(full)?;
    if full.exists() {
        fs::copy(full, staging)?;
    } else {
        File::create(staging)?;
    }
    Ok(())
}

/// Positioned, fsynced write of one chunk into the staging file.
fn write_chunk(staging: &Path, index: u32, chunk_size: u32, data: &[u8]) -> std::io::Result<()> {
    let mut f = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(staging)?;
    f.seek(SeekFrom::Start(u64::from(index) * u64::from(chunk_size)))?;
    f.write_all(data)?;
    f.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::FsNotepadHooks;
    use echo_discovery::PeerTable;
    use echo_meta::StoreConfig;
    use echo_net::session::read_frame;
    use echo_net::{connect_to_peer, start_server};
    use echo_protocol::Codec;
    use echo_types::{Peer, Role};
    use std::net::{IpAddr, Ipv4Addr, TcpListener, TcpStream};
    use std::thread;
    use std::time::{Duration, Instant};

    struct TestNode {
        _dir: tempfile::TempDir,
        root: PathBuf,
        store: Arc<MetadataStore>,
        registry: Arc<SessionRegistry>,
        engine: Arc<SyncEngine>,
    }

    fn node() -> TestNode {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let store = Arc::new(MetadataStore::open(StoreConfig::in_dir(&root)).unwrap());
        let registry = Arc::new(SessionRegistry::new());
        let engine = SyncEngine::new(
            SyncConfig::new(root.clone()),
            Arc::clone(&store),
            Arc::clone(&registry),
            Arc::new(FsNotepadHooks::new(root.clone())),
        );
        TestNode {
            _dir: dir,
            root,
            store,
            registry,
            engine,
        }
    }

    /// Wire a writer node to a reader node over localhost TCP.
    fn connect(writer: &TestNode, reader: &TestNode) {
        let handler: Arc<dyn FrameHandler> = reader.engine.clone();
        let port = start_server(0, Arc::clone(&reader.registry), handler).unwrap();

        let table = PeerTable::new();
        table.upsert(Peer {
            username: "reader".into(),
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            role: Role::Reader,
            tcp_port: port,
        });
        let handler: Arc<dyn FrameHandler> = writer.engine.clone();
        let engine = Arc::clone(&writer.engine);
        connect_to_peer("reader", &table, &writer.registry, &handler, |s| {
            engine.announce_current_to(s)
        })
        .unwrap();
    }

    fn wait_for<F: Fn() -> bool>(cond: F) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        false
    }

    fn converged(reader: &TestNode, path: &str, expected: &[u8]) -> bool {
        fs::read(reader.root.join(path)).map_or(false, |b| b == expected)
            && reader.store.get(path).is_some()
    }

    #[test]
    fn commit_bumps_version_and_stores() {
        let writer = node();
        fs::write(writer.root.join("pad.txt"), b"first").unwrap();

        let m1 = writer.engine.commit("pad.txt").unwrap();
        assert_eq!(m1.version, 1);
        let m2 = writer.engine.commit("pad.txt").unwrap();
        assert_eq!(m2.version, 2);
        assert_eq!(writer.store.get("pad.txt").unwrap().version, 2);
    }

    #[test]
    fn commit_rejects_escaping_paths() {
        let writer = node();
        assert!(matches!(
            writer.engine.commit("../outside.txt"),
            Err(SyncError::UnsafePath(_))
        ));
    }

    #[test]
    fn empty_file_syncs() {
        let writer = node();
        let reader = node();
        connect(&writer, &reader);

        fs::write(writer.root.join("pad.txt"), b"").unwrap();
        writer.engine.open_notepad("pad.txt").unwrap();

        assert!(wait_for(|| converged(&reader, "pad.txt", b"")));
        let meta = reader.store.get("pad.txt").unwrap();
        assert_eq!(meta.version, 1);
        assert_eq!(meta.size, 0);
        assert!(meta.hashes.is_empty());
    }

    #[test]
    fn full_sync_three_chunks() {
        let writer = node();
        let reader = node();
        connect(&writer, &reader);

        let content = vec![b'a'; 10_000];
        fs::write(writer.root.join("pad.txt"), &content).unwrap();
        let meta = writer.engine.open_notepad("pad.txt").unwrap();
        assert_eq!(meta.hashes.len(), 3);

        assert!(wait_for(|| converged(&reader, "pad.txt", &content)));
        let reader_meta = reader.store.get("pad.txt").unwrap();
        assert_eq!(reader_meta.size, 10_000);
        assert_eq!(reader_meta.hashes, meta.hashes);
    }

    #[test]
    fn append_retransfers_only_the_tail() {
        let writer = node();
        let reader = node();
        connect(&writer, &reader);

        let mut content = vec![b'a'; 10_000];
        fs::write(writer.root.join("pad.txt"), &content).unwrap();
        let first = writer.engine.open_notepad("pad.txt").unwrap();
        assert!(wait_for(|| converged(&reader, "pad.txt", &content)));

        content.extend_from_slice(&[b'b'; 100]);
        fs::write(writer.root.join("pad.txt"), &content).unwrap();
        let second = writer.engine.commit("pad.txt").unwrap();
        // Only the final chunk's digest changed.
        assert_eq!(second.hashes.len(), 3);
        assert_eq!(second.hashes[0], first.hashes[0]);
        assert_eq!(second.hashes[1], first.hashes[1]);
        assert_ne!(second.hashes[2], first.hashes[2]);

        assert!(wait_for(|| converged(&reader, "pad.txt", &content)));
        assert_eq!(
            fs::read(reader.root.join("pad.txt")).unwrap().len(),
            10_100
        );
    }

    #[test]
    fn mid_chunk_edit_retransfers_only_that_chunk() {
        let writer = node();
        let reader = node();
        connect(&writer, &reader);

        let mut content = vec![b'a'; 10_000];
        fs::write(writer.root.join("pad.txt"), &content).unwrap();
        let first = writer.engine.open_notepad("pad.txt").unwrap();
        assert!(wait_for(|| converged(&reader, "pad.txt", &content)));

        content[0] = b'X';
        fs::write(writer.root.join("pad.txt"), &content).unwrap();
        let second = writer.engine.commit("pad.txt").unwrap();
        assert_ne!(second.hashes[0], first.hashes[0]);
        assert_eq!(second.hashes[1], first.hashes[1]);
        assert_eq!(second.hashes[2], first.hashes[2]);

        assert!(wait_for(|| converged(&reader, "pad.txt", &content)));
    }

    #[test]
    fn shrinking_file_discards_trailing_bytes() {
        let writer = node();
        let reader = node();
        connect(&writer, &reader);

        let long = vec![b'a'; 10_000];
        fs::write(writer.root.join("pad.txt"), &long).unwrap();
        writer.engine.open_notepad("pad.txt").unwrap();
        assert!(wait_for(|| converged(&reader, "pad.txt", &long)));

        let short = vec![b'c'; 2_000];
        fs::write(writer.root.join("pad.txt"), &short).unwrap();
        writer.engine.commit("pad.txt").unwrap();

        assert!(wait_for(|| converged(&reader, "pad.txt", &short)));
        assert_eq!(fs::read(reader.root.join("pad.txt")).unwrap().len(), 2_000);
    }

    #[test]
    fn late_joiner_gets_snapshot_on_connect() {
        let writer = node();
        let reader = node();

        let content = b"opened before anyone was listening".to_vec();
        fs::write(writer.root.join("pad.txt"), &content).unwrap();
        writer.engine.open_notepad("pad.txt").unwrap();

        // The reader appears only now; the dial bootstrap announces.
        connect(&writer, &reader);
        assert!(wait_for(|| converged(&reader, "pad.txt", &content)));
    }

    #[test]
    fn nested_paths_create_parent_directories() {
        let writer = node();
        let reader = node();
        connect(&writer, &reader);

        let rel = "notes/2026/pad.txt";
        fs::create_dir_all(writer.root.join("notes/2026")).unwrap();
        fs::write(writer.root.join(rel), b"nested").unwrap();
        writer.engine.open_notepad(rel).unwrap();

        assert!(wait_for(|| converged(&reader, rel, b"nested")));
    }

    // ---- direct handler tests over a local socket pair ----

    fn session_pair() -> (Arc<Session>, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let join = thread::spawn(move || TcpStream::connect(addr).unwrap());
        let (accepted, _) = listener.accept().unwrap();
        let far = join.join().unwrap();
        (
            Arc::new(Session::new("test-peer".into(), &accepted).unwrap()),
            far,
        )
    }

    #[test]
    fn late_chunk_without_state_is_dropped() {
        let reader = node();
        let (session, _far) = session_pair();

        reader.engine.on_message(
            &session,
            Message::PutChunk {
                path: "ghost.txt".into(),
                index: 0,
                data: vec![1, 2, 3],
            },
        );
        assert!(!reader.root.join("ghost.txt").exists());
        assert!(!reader.root.join("ghost.txt.part").exists());
    }

    #[test]
    fn corrupt_chunk_is_rerequested() {
        let reader = node();
        let (session, mut far) = session_pair();

        let good = vec![b'g'; 100];
        let desc = Message::FileDesc {
            path: "pad.txt".into(),
            version: 1,
            size: 100,
            chunk_size: 4096,
            hashes: vec![ChunkDigest::of(&good)],
        };
        reader.engine.on_message(&session, desc);

        // The reader asks for chunk 0.
        let (tag, payload) = read_frame(&mut far).unwrap().unwrap();
        assert_eq!(
            Codec::decode_payload(tag, &payload).unwrap(),
            Message::GetChunks {
                path: "pad.txt".into(),
                indices: vec![0],
            }
        );

        // Deliver a corrupted chunk: it is rejected and re-requested.
        reader.engine.on_message(
            &session,
            Message::PutChunk {
                path: "pad.txt".into(),
                index: 0,
                data: vec![b'X'; 100],
            },
        );
        let (tag, payload) = read_frame(&mut far).unwrap().unwrap();
        assert_eq!(
            Codec::decode_payload(tag, &payload).unwrap(),
            Message::GetChunks {
                path: "pad.txt".into(),
                indices: vec![0],
            }
        );
        assert!(!reader.root.join("pad.txt").exists());

        // The correct bytes finalize the transfer.
        reader.engine.on_message(
            &session,
            Message::PutChunk {
                path: "pad.txt".into(),
                index: 0,
                data: good.clone(),
            },
        );
        assert_eq!(fs::read(reader.root.join("pad.txt")).unwrap(), good);
        assert!(!reader.root.join("pad.txt.part").exists());
    }

    #[test]
    fn newer_descriptor_supersedes_inflight_transfer() {
        let reader = node();
        let (session, mut far) = session_pair();

        let old = vec![b'o'; 50];
        reader.engine.on_message(
            &session,
            Message::FileDesc {
                path: "pad.txt".into(),
                version: 1,
                size: 50,
                chunk_size: 4096,
                hashes: vec![ChunkDigest::of(&old)],
            },
        );
        let _ = read_frame(&mut far).unwrap().unwrap();

        let new = vec![b'n'; 60];
        reader.engine.on_message(
            &session,
            Message::FileDesc {
                path: "pad.txt".into(),
                version: 2,
                size: 60,
                chunk_size: 4096,
                hashes: vec![ChunkDigest::of(&new)],
            },
        );
        let _ = read_frame(&mut far).unwrap().unwrap();

        // A chunk from the superseded revision fails verification now.
        reader.engine.on_message(
            &session,
            Message::PutChunk {
                path: "pad.txt".into(),
                index: 0,
                data: old,
            },
        );
        assert!(!reader.root.join("pad.txt").exists());

        reader.engine.on_message(
            &session,
            Message::PutChunk {
                path: "pad.txt".into(),
                index: 0,
                data: new.clone(),
            },
        );
        assert_eq!(fs::read(reader.root.join("pad.txt")).unwrap(), new);
        assert_eq!(reader.store.get("pad.txt").unwrap().size, 60);
    }

    #[test]
    fn matching_descriptor_updates_version_without_transfer() {
        let reader = node();
        let (session, mut far) = session_pair();

        let content = b"already here".to_vec();
        fs::write(reader.root.join("pad.txt"), &content).unwrap();
        let meta = echo_chunk::describe(&reader.root.join("pad.txt"), 4096).unwrap();
        reader
            .store
            .put(
                "pad.txt",
                FileMeta {
                    version: 1,
                    ..meta.clone()
                },
            )
            .unwrap();

        reader.engine.on_message(
            &session,
            Message::FileDesc {
                path: "pad.txt".into(),
                version: 5,
                size: meta.size,
                chunk_size: 4096,
                hashes: meta.hashes.clone(),
            },
        );

        assert_eq!(reader.store.get("pad.txt").unwrap().version, 5);
        // No GET_CHUNKS was sent.
        far.set_read_timeout(Some(Duration::from_millis(200))).unwrap();
        let mut probe = [0u8; 1];
        use std::io::Read;
        match far.read(&mut probe) {
            Ok(0) | Err(_) => {}
            Ok(_) => panic!("unexpected frame from reader"),
        }
    }

    #[test]
    fn escaping_descriptor_paths_are_rejected() {
        let reader = node();
        let (session, _far) = session_pair();

        reader.engine.on_message(
            &session,
            Message::FileDesc {
                path: "../evil.txt".into(),
                version: 1,
                size: 4,
                chunk_size: 4096,
                hashes: vec![ChunkDigest::of(b"evil")],
            },
        );
        assert!(!reader.root.parent().unwrap().join("evil.txt").exists());
        assert!(!reader.root.parent().unwrap().join("evil.txt.part").exists());
    }
}
