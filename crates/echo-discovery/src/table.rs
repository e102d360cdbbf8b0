use std::collections::HashMap;
use std::sync::RwLock;

use echo_types::{Peer, Role};

/// Shared table of discovered peers, keyed by username.
///
/// Callers take snapshot copies rather than holding the lock across I/O.
#[derive(Default)]
pub struct PeerTable {
    peers: RwLock<HashMap<String, Peer>>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for the peer's username.
    pub fn upsert(&self, peer: Peer) {
        let mut peers = self.peers.write().expect("peer table lock poisoned");
        peers.insert(peer.username.clone(), peer);
    }

    /// Copy of one peer's entry.
    pub fn get(&self, username: &str) -> Option<Peer> {
        self.peers
            .read()
            .expect("peer table lock poisoned")
            .get(username)
            .cloned()
    }

    /// Copies of all entries, sorted by username.
    pub fn snapshot(&self) -> Vec<Peer> {
        let peers = self.peers.read().expect("peer table lock poisoned");
        let mut out: Vec<Peer> = peers.values().cloned().collect();
        out.sort_by(|a, b| a.username.cmp(&b.username));
        out
    }

    /// Copies of all reader entries.
    pub fn readers(&self) -> Vec<Peer> {
        self.snapshot()
            .into_iter()
            .filter(|p| p.role == Role::Reader)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.read().expect("peer table lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
