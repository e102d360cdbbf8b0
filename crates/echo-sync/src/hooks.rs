use std::fs;
use std::io;
use std::path::PathBuf;

/// Contract between the sync core and the editor/viewer front-end.
///
/// Paths are relative to the sync root. The editor decides when to commit;
/// the core turns a commit into `describe → store.put → broadcast`.
pub trait NotepadHooks: Send + Sync + 'static {
    /// Reader side: a writer announced a notepad. Start the local viewer.
    /// Must be idempotent — announcements repeat on reconnect.
    fn on_open_notepad(&self, path: &str);

    /// Current buffer contents for `path`.
    fn read_current_text(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Replace the buffer contents of `path`.
    fn write_current_text(&self, path: &str, bytes: &[u8]) -> io::Result<()>;
}

/// Hooks that go straight to files under the sync root. Headless: the
/// viewer callback does nothing. Front-ends that poll the synced file
/// (the CLI viewer does) can build on this.
pub struct FsNotepadHooks {
    root: PathBuf,
}

impl FsNotepadHooks {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl NotepadHooks for FsNotepadHooks {
    fn on_open_notepad(&self, _path: &str) {}

    fn read_current_text(&self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.root.join(path))
    }

    fn write_current_text(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(full, bytes)
    }
}
