use std::net::TcpStream;
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use echo_protocol::{Codec, ProtocolError};

use crate::handler::FrameHandler;
use crate::registry::SessionRegistry;
use crate::session::{read_frame, Session};

/// Spawn the receive thread for a session.
///
/// Reads frames until clean EOF or a session-fatal error, handing each
/// decoded message to the handler. Malformed payloads skip the frame;
/// suspect length headers close the session. On exit the session is
/// removed from the registry and closed.
pub fn spawn_receive_loop(
    mut stream: TcpStream,
    session: Arc<Session>,
    registry: Arc<SessionRegistry>,
    handler: Arc<dyn FrameHandler>,
) {
    let name = format!("recv-{}", session.key());
    let spawned = thread::Builder::new().name(name).spawn(move || {
        loop {
            match read_frame(&mut stream) {
                Ok(Some((tag, payload))) => match Codec::decode_payload(tag, &payload) {
                    Ok(msg) => {
                        debug!(peer = session.key(), msg = msg.type_name(), "frame received");
                        handler.on_message(&session, msg);
                    }
                    Err(ProtocolError::UnknownType(t)) => {
                        debug!(peer = session.key(), tag = t, "skipping unknown frame type");
                    }
                    Err(e) => {
                        debug!(peer = session.key(), error = %e, "skipping malformed frame");
                    }
                },
                Ok(None) => {
                    info!(peer = session.key(), "session closed by peer");
                    break;
                }
                Err(e) => {
                    warn!(peer = session.key(), error = %e, "session error, closing");
                    break;
                }
            }
        }
        registry.remove(session.key());
        session.close();
        handler.on_close(&session);
    });
    if let Err(e) = spawned {
        warn!(error = %e, "failed to spawn receive thread");
    }
}
