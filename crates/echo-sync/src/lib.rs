//! Sync protocol engine for Echo.
//!
//! The [`SyncEngine`] drives both sides of the protocol over sessions owned
//! by the connection registry:
//!
//! - **Writer side**: [`SyncEngine::commit`] turns a local save into
//!   `describe → store.put → broadcast FILE_DESC`, and `GET_CHUNKS`
//!   requests are answered with one `PUT_CHUNK` per index.
//! - **Reader side**: an incoming `FILE_DESC` is diffed against the local
//!   store; missing chunks are requested, written into a `<path>.part`
//!   staging file, verified against the announced digests, and atomically
//!   renamed into place when the transfer completes.
//!
//! The editor/viewer front-end plugs in through [`NotepadHooks`].

pub mod diff;
pub mod engine;
pub mod error;
pub mod hooks;

pub use diff::missing_indices;
pub use engine::{SyncConfig, SyncEngine};
pub use error::{Result, SyncError};
pub use hooks::{FsNotepadHooks, NotepadHooks};
