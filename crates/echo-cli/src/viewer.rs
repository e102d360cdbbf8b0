use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use colored::Colorize;
use tracing::debug;

use echo_sync::NotepadHooks;

/// Reader-side hooks: when a writer announces a notepad, spawn a thread
/// that polls the synced file and reprints it on change.
pub struct ViewerHooks {
    root: PathBuf,
    active: Mutex<HashSet<String>>,
}

impl ViewerHooks {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            active: Mutex::new(HashSet::new()),
        }
    }
}

impl NotepadHooks for ViewerHooks {
    fn on_open_notepad(&self, path: &str) {
        {
            let mut active = self.active.lock().expect("viewer lock poisoned");
            // Announcements repeat on reconnect; one viewer per path.
            if !active.insert(path.to_string()) {
                debug!(path, "viewer already running");
                return;
            }
        }
        let full = self.root.join(path);
        let title = path.to_string();
        thread::spawn(move || {
            let mut last: Option<Vec<u8>> = None;
            loop {
                let content = fs::read(&full).unwrap_or_default();
                if last.as_deref() != Some(content.as_slice()) {
                    println!("\n{} {}", "[viewer]".cyan().bold(), title.bold());
                    println!("{}", String::from_utf8_lossy(&content));
                    print!("> ");
                    let _ = io::stdout().flush();
                    last = Some(content);
                }
                thread::sleep(Duration::from_secs(1));
            }
        });
    }

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
