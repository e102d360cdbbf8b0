//! Foundation types for Echo, the LAN notepad sync core.
//!
//! This crate provides the vocabulary shared by every other Echo crate.
//!
//! # Key Types
//!
//! - [`ChunkDigest`] — Content digest of one file chunk (BLAKE3 hash)
//! - [`FileMeta`] — Descriptor for one revision of a synced file
//! - [`Peer`] / [`Role`] — A discovered peer and the role it advertises

pub mod digest;
pub mod error;
pub mod meta;
pub mod peer;

pub use digest::ChunkDigest;
pub use error::TypeError;
pub use meta::{unix_now, FileMeta, DEFAULT_CHUNK_SIZE};
pub use peer::{Peer, Role};
