use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use echo_types::FileMeta;

use crate::error::{Result, StoreError};
use crate::record::{path_is_recordable, Record};

/// Configuration for the metadata store.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Snapshot file path.
    pub snapshot_path: PathBuf,
    /// WAL file path.
    pub wal_path: PathBuf,
    /// Compaction threshold: WAL length in bytes (default 1 MiB).
    pub max_wal_bytes: u64,
}

impl StoreConfig {
    /// Conventional file names (`snapshot.txt`, `wal.log`) under `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            snapshot_path: dir.join("snapshot.txt"),
            wal_path: dir.join("wal.log"),
            max_wal_bytes: 1024 * 1024,
        }
    }
}

/// WAL handle with its tracked length.
struct WalFile {
    file: File,
    len: u64,
}

/// Crash-consistent mapping from path to [`FileMeta`].
///
/// Two mutexes guard the store: the data map and the WAL file. Writers take
/// data before WAL; compaction takes WAL before data and is the only
/// reverse order — it cannot deadlock because no writer holds the WAL lock
/// while waiting on the data lock.
pub struct MetadataStore {
    config: StoreConfig,
    files: Mutex<HashMap<String, FileMeta>>,
    wal: Mutex<WalFile>,
}

impl MetadataStore {
    /// Open the store: load the snapshot, then replay the WAL.
    ///
    /// Empty and malformed lines are skipped; later records override
    /// earlier ones and `DEL` erases the mapping.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let mut files = HashMap::new();
        let snap_applied = Self::apply_file(&config.snapshot_path, &mut files)?;
        let wal_applied = Self::apply_file(&config.wal_path, &mut files)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.wal_path)?;
        let len = file.metadata()?.len();

        info!(
            snapshot = snap_applied,
            wal = wal_applied,
            entries = files.len(),
            "metadata store loaded"
        );
        Ok(Self {
            config,
            files: Mutex::new(files),
            wal: Mutex::new(WalFile { file, len }),
        })
    }

    /// Replay one record file into `files`. Returns the applied count.
    fn apply_file(path: &Path, files: &mut HashMap<String, FileMeta>) -> Result<usize> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let mut applied = 0;
        for line in BufReader::new(file).lines() {
            let line = line?;
            match Record::parse_line(&line) {
                Some(Record::Put { path, meta }) => {
                    files.insert(path, meta);
                    applied += 1;
                }
                Some(Record::Del { path }) => {
                    files.remove(&path);
                    applied += 1;
                }
                None => {
                    if !line.is_empty() {
                        warn!(file = %path.display(), line = %line, "skipping malformed record");
                    }
                }
            }
        }
        Ok(applied)
    }

    /// Store a descriptor. Returns once the `PUT` record is fsync-durable.
    ///
    /// Strict mode: a WAL failure is returned to the caller. The in-memory
    /// update has already been applied and is kept; the record is lost on
    /// restart.
    pub fn put(&self, path: &str, meta: FileMeta) -> Result<()> {
        if !path_is_recordable(path) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        {
            let mut files = self.files.lock().expect("data mutex poisoned");
            files.insert(path.to_string(), meta.clone());
        }
        self.append(&Record::Put {
            path: path.to_string(),
            meta,
        })?;
        self.snapshot_if_needed()
    }

    /// Look up a descriptor. Pure memory read.
    pub fn get(&self, path: &str) -> Option<FileMeta> {
        self.files
            .lock()
            .expect("data mutex poisoned")
            .get(path)
            .cloned()
    }

    /// Remove a mapping. Returns once the `DEL` record is fsync-durable.
    pub fn del(&self, path: &str) -> Result<()> {
        if !path_is_recordable(path) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        {
            let mut files = self.files.lock().expect("data mutex poisoned");
            files.remove(path);
        }
        self.append(&Record::Del {
            path: path.to_string(),
        })?;
        self.snapshot_if_needed()
    }

    /// Consistent snapshot of every entry, sorted by path.
    pub fn dump_all(&self) -> Vec<(String, FileMeta)> {
        let files = self.files.lock().expect("data mutex poisoned");
        let mut out: Vec<_> = files.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Append one record to the WAL, durably.
    fn append(&self, record: &Record) -> Result<()> {
        let mut line = record.to_line();
        line.push('\n');

        let mut wal = self.wal.lock().expect("WAL mutex poisoned");
        wal.file.write_all(line.as_bytes())?;
        wal.file.sync_all()?;
        wal.len += line.len() as u64;
        debug!(len = wal.len, "WAL append");
        Ok(())
    }

    /// Compact when the WAL has grown past the threshold: write every live
    /// entry to `<snapshot>.tmp`, rename it over the snapshot, truncate the
    /// WAL.
    fn snapshot_if_needed(&self) -> Result<()> {
        let mut wal = self.wal.lock().expect("WAL mutex poisoned");
        if wal.len < self.config.max_wal_bytes {
            return Ok(());
        }

        let entries = self.dump_all();

        let tmp = tmp_path(&self.config.snapshot_path);
        {
            let mut out = File::create(&tmp)?;
            for (path, meta) in &entries {
                let rec = Record::Put {
                    path: path.clone(),
                    meta: meta.clone(),
                };
                out.write_all(rec.to_line().as_bytes())?;
                out.write_all(b"\n")?;
            }
            out.sync_all()?;
        }
        fs::rename(&tmp, &self.config.snapshot_path)?;

        wal.file.set_len(0)?;
        wal.file.sync_all()?;
        wal.len = 0;

        info!(entries = entries.len(), "snapshot compacted, WAL truncated");
        Ok(())
    }
}

fn tmp_path(snapshot: &Path) -> PathBuf {
    let mut os = snapshot.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}
