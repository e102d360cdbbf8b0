use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use echo_protocol::Message;

use crate::session::Session;

/// Shared map of live sessions, keyed by `"<ip>:<port>"`.
///
/// The lock is held only to look up or copy out sessions, never across
/// socket I/O.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Arc<Session>) {
        let mut sessions = self.sessions.lock().expect("sockets mutex poisoned");
        sessions.insert(session.key().to_string(), session);
    }

    pub fn remove(&self, key: &str) -> Option<Arc<Session>> {
        let mut sessions = self.sessions.lock().expect("sockets mutex poisoned");
        sessions.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<Arc<Session>> {
        let sessions = self.sessions.lock().expect("sockets mutex poisoned");
        sessions.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        let sessions = self.sessions.lock().expect("sockets mutex poisoned");
        sessions.contains_key(key)
    }

    /// Copies of every live session.
    pub fn snapshot(&self) -> Vec<Arc<Session>> {
        let sessions = self.sessions.lock().expect("sockets mutex poisoned");
        sessions.values().cloned().collect()
    }

    /// Send a message to every session. A session whose send fails is
    /// closed and dropped from the map; its peer rediscovers via broadcast.
    pub fn broadcast(&self, msg: &Message) {
        for session in self.snapshot() {
            if let Err(e) = session.send(msg) {
                warn!(peer = session.key(), error = %e, "send failed, dropping session");
                self.remove(session.key());
                session.close();
            } else {
                debug!(peer = session.key(), msg = msg.type_name(), "sent");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("sockets mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
