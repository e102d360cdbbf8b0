use std::net::TcpStream;
use std::sync::Arc;

use tracing::{info, warn};

use echo_discovery::PeerTable;
use echo_types::Role;

use crate::error::{NetError, Result};
use crate::handler::FrameHandler;
use crate::recv::spawn_receive_loop;
use crate::registry::SessionRegistry;
use crate::session::Session;

/// Dial the named reader peer (writers only).
///
/// Looks the username up in the peer table, connects, registers the
/// session, and spawns its receive loop. `on_connect` runs on the fresh
/// session before the receive loop starts — the sync engine uses it to
/// announce the currently open notepad to a late-joining reader. Dialing a
/// peer that is already connected returns the existing session.
pub fn connect_to_peer(
    username: &str,
    table: &PeerTable,
    registry: &Arc<SessionRegistry>,
    handler: &Arc<dyn FrameHandler>,
    on_connect: impl FnOnce(&Arc<Session>),
) -> Result<Arc<Session>> {
    let peer = table
        .get(username)
        .ok_or_else(|| NetError::PeerNotFound(username.to_string()))?;
    if peer.role != Role::Reader {
        return Err(NetError::NotAReader(username.to_string()));
    }
    if peer.tcp_port == 0 {
        return Err(NetError::PortUnknown(username.to_string()));
    }

    let key = peer.session_key();
    if let Some(existing) = registry.get(&key) {
        return Ok(existing);
    }

    let stream = TcpStream::connect((peer.ip, peer.tcp_port))?;
    let session = Arc::new(Session::new(key, &stream)?);
    registry.insert(Arc::clone(&session));
    info!(peer = %username, key = session.key(), "connected");

    on_connect(&session);
    spawn_receive_loop(
        stream,
        Arc::clone(&session),
        Arc::clone(registry),
        Arc::clone(handler),
    );
    Ok(session)
}

/// Dial every known reader not already in the registry. Returns how many
/// new sessions were established; individual failures are logged and
/// skipped.
pub fn connect_all_readers(
    table: &PeerTable,
    registry: &Arc<SessionRegistry>,
    handler: &Arc<dyn FrameHandler>,
    on_connect: impl Fn(&Arc<Session>),
) -> usize {
    let mut connected = 0;
    for peer in table.readers() {
        if peer.tcp_port == 0 || registry.contains(&peer.session_key()) {
            continue;
        }
        match connect_to_peer(&peer.username, table, registry, handler, &on_connect) {
            Ok(_) => connected += 1,
            Err(e) => warn!(peer = %peer.username, error = %e, "dial failed"),
        }
    }
    connected
}

#[cfg(test)]
mod tests {
    use super::*;
    use echo_protocol::Message;
    use echo_types::Peer;
    use std::net::{IpAddr, Ipv4Addr, TcpListener};
    use std::sync::Mutex;

    struct NullHandler;
    impl FrameHandler for NullHandler {
        fn on_message(&self, _session: &Arc<Session>, _msg: Message) {}
    }

    fn handler() -> Arc<dyn FrameHandler> {
        Arc::new(NullHandler)
    }

    fn reader_peer(name: &str, port: u16) -> Peer {
        Peer {
            username: name.into(),
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            role: Role::Reader,
            tcp_port: port,
        }
    }

    #[test]
    fn unknown_peer_is_not_found() {
        let table = PeerTable::new();
        let registry = Arc::new(SessionRegistry::new());
        let err = connect_to_peer("ghost", &table, &registry, &handler(), |_| {}).unwrap_err();
        assert!(matches!(err, NetError::PeerNotFound(_)));
    }

    #[test]
    fn writers_are_not_dialable() {
        let table = PeerTable::new();
        table.upsert(Peer {
            role: Role::Writer,
            ..reader_peer("scribe", 40001)
        });
        let registry = Arc::new(SessionRegistry::new());
        let err = connect_to_peer("scribe", &table, &registry, &handler(), |_| {}).unwrap_err();
        assert!(matches!(err, NetError::NotAReader(_)));
    }

    #[test]
    fn missing_port_is_rejected() {
        let table = PeerTable::new();
        table.upsert(reader_peer("early", 0));
        let registry = Arc::new(SessionRegistry::new());
        let err = connect_to_peer("early", &table, &registry, &handler(), |_| {}).unwrap_err();
        assert!(matches!(err, NetError::PortUnknown(_)));
    }

    #[test]
    fn dial_registers_session_and_runs_on_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        // Keep the accepted stream alive for the duration of the test.
        let accepted = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&accepted);
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            *slot.lock().unwrap() = Some(stream);
        });

        let table = PeerTable::new();
        table.upsert(reader_peer("alice", port));
        let registry = Arc::new(SessionRegistry::new());

        let mut greeted = false;
        let session =
            connect_to_peer("alice", &table, &registry, &handler(), |_| greeted = true).unwrap();
        assert!(greeted);
        assert_eq!(session.key(), format!("127.0.0.1:{port}"));
        assert!(registry.contains(session.key()));
    }

    #[test]
    fn connect_all_readers_skips_connected_and_portless() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepted = Arc::new(Mutex::new(Vec::new()));
        let slot = Arc::clone(&accepted);
        std::thread::spawn(move || {
            for conn in listener.incoming() {
                slot.lock().unwrap().push(conn.unwrap());
            }
        });

        let table = PeerTable::new();
        table.upsert(reader_peer("alice", port));
        table.upsert(reader_peer("early", 0));
        let registry = Arc::new(SessionRegistry::new());

        let n = connect_all_readers(&table, &registry, &handler(), |_| {});
        assert_eq!(n, 1);
        // A second sweep finds nothing new.
        let n = connect_all_readers(&table, &registry, &handler(), |_| {});
        assert_eq!(n, 0);
        assert_eq!(registry.len(), 1);
    }
}
