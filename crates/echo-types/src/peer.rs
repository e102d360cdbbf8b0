use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Role a peer plays in the sync topology.
///
/// Writers publish revisions; readers accept inbound connections and
/// converge to the latest writer revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Writer,
    Reader,
}

impl Role {
    /// Single-character tag used in discovery packets.
    pub fn wire_tag(self) -> &'static str {
        match self {
            Self::Writer => "W",
            Self::Reader => "R",
        }
    }

    /// Parse the discovery packet tag.
    pub fn from_wire_tag(s: &str) -> Result<Self, TypeError> {
        match s {
            "W" => Ok(Self::Writer),
            "R" => Ok(Self::Reader),
            other => Err(TypeError::InvalidRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Writer => write!(f, "Writer"),
            Self::Reader => write!(f, "Reader"),
        }
    }
}

/// A peer learned from discovery.
///
/// Keyed by `username`; subsequent announcements from the same username
/// overwrite the entry (last seen wins).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub username: String,
    pub ip: IpAddr,
    pub role: Role,
    pub tcp_port: u16,
}

impl Peer {
    /// Session key a connection to this peer registers under.
    pub fn session_key(&self) -> String {
        format!("{}:{}", self.ip, self.tcp_port)
    }
}
