use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info, warn};

use echo_types::{Peer, Role};

use crate::error::Result;
use crate::packet::Announcement;
use crate::table::PeerTable;

/// Default discovery UDP port (`ECHO_DISCOVERY_PORT` overrides it upstream).
pub const DEFAULT_DISCOVERY_PORT: u16 = 45000;

/// Interval between announcement broadcasts.
pub const BROADCAST_INTERVAL: Duration = Duration::from_secs(3);

/// Configuration for the discovery loops.
#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    /// UDP port both loops bind to / target.
    pub port: u16,
    /// Broadcast period; also bounds how long `stop` takes to drain.
    pub interval: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_DISCOVERY_PORT,
            interval: BROADCAST_INTERVAL,
        }
    }
}

/// Identity this node announces.
#[derive(Clone, Debug)]
pub struct Identity {
    pub username: String,
    pub role: Role,
    pub tcp_port: u16,
}

/// The two discovery loops: a broadcaster announcing this node and a
/// listener upserting the peer table from everyone else's announcements.
pub struct DiscoveryService {
    config: DiscoveryConfig,
    identity: Identity,
    table: Arc<PeerTable>,
    running: Arc<AtomicBool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl DiscoveryService {
    pub fn new(config: DiscoveryConfig, identity: Identity, table: Arc<PeerTable>) -> Self {
        Self {
            config,
            identity,
            table,
            running: Arc::new(AtomicBool::new(false)),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the broadcaster and listener threads.
    pub fn start(&self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);

        let broadcast = broadcast_socket()?;
        let listen = listen_socket(self.config.port, self.config.interval)?;

        let announcement = Announcement {
            username: self.identity.username.clone(),
            role: self.identity.role,
            tcp_port: self.identity.tcp_port,
        };
        let target = SocketAddr::from((Ipv4Addr::BROADCAST, self.config.port));
        let interval = self.config.interval;

        let running = Arc::clone(&self.running);
        let broadcaster = thread::spawn(move || {
            let wire = announcement.to_wire();
            while running.load(Ordering::SeqCst) {
                if let Err(e) = broadcast.send_to(wire.as_bytes(), target) {
                    warn!(error = %e, "discovery broadcast failed");
                }
                thread::sleep(interval);
            }
        });

        let running = Arc::clone(&self.running);
        let own_username = self.identity.username.clone();
        let table = Arc::clone(&self.table);
        let listener = thread::spawn(move || {
            let mut buf = [0u8; 1024];
            while running.load(Ordering::SeqCst) {
                let (n, src) = match listen.recv_from(&mut buf) {
                    Ok(r) => r,
                    Err(e)
                        if e.kind() == std::io::ErrorKind::WouldBlock
                            || e.kind() == std::io::ErrorKind::TimedOut =>
                    {
                        continue;
                    }
                    Err(e) => {
                        warn!(error = %e, "discovery receive failed");
                        continue;
                    }
                };
                let Ok(text) = std::str::from_utf8(&buf[..n]) else {
                    continue;
                };
                let Some(ann) = Announcement::parse(text) else {
                    continue;
                };
                if ann.username == own_username {
                    continue;
                }
                debug!(username = %ann.username, role = %ann.role, ip = %src.ip(), "peer announcement");
                table.upsert(Peer {
                    username: ann.username,
                    ip: src.ip(),
                    role: ann.role,
                    tcp_port: ann.tcp_port,
                });
            }
        });

        let mut handles = self.handles.lock().expect("handle mutex poisoned");
        handles.push(broadcaster);
        handles.push(listener);
        info!(port = self.config.port, "discovery started");
        Ok(())
    }

    /// Clear the running flag and join both loops. They drain within one
    /// broadcast interval (the listener socket carries a read timeout).
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let handles: Vec<_> = {
            let mut guard = self.handles.lock().expect("handle mutex poisoned");
            guard.drain(..).collect()
        };
        for h in handles {
            let _ = h.join();
        }
        info!("discovery stopped");
    }

    /// The table this service feeds.
    pub fn table(&self) -> &Arc<PeerTable> {
        &self.table
    }
}

/// UDP socket for sending subnet broadcasts.
fn broadcast_socket() -> Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_broadcast(true)?;
    socket.set_reuse_address(true)?;
    let bind: SocketAddr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0).into();
    socket.bind(&bind.into())?;
    Ok(socket.into())
}

/// Listener socket bound to the discovery port. `SO_REUSEADDR` lets several
/// peers share a host; the read timeout lets the loop observe shutdown.
fn listen_socket(port: u16, timeout: Duration) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_read_timeout(Some(timeout))?;
    let bind: SocketAddr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port).into();
    socket.bind(&bind.into())?;
    Ok(socket.into())
}
