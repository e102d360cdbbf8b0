//! Peer discovery for Echo.
//!
//! Each node broadcasts `username|role|tcp_port` datagrams to the local
//! subnet every few seconds and listens for the announcements of others.
//! Valid packets upsert the [`PeerTable`]; packets carrying our own
//! username and malformed packets are dropped. Entries never expire — a
//! stale peer is harmless because a later connect attempt simply fails.

pub mod error;
pub mod packet;
pub mod service;
pub mod table;

pub use error::{DiscoveryError, Result};
pub use packet::Announcement;
pub use service::{
    DiscoveryConfig, DiscoveryService, Identity, BROADCAST_INTERVAL, DEFAULT_DISCOVERY_PORT,
};
pub use table::PeerTable;
