use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use tracing::{info, warn};

use crate::handler::FrameHandler;
use crate::recv::spawn_receive_loop;
use crate::registry::SessionRegistry;
use crate::session::Session;

/// Start the accept loop on `0.0.0.0:port` (readers only).
///
/// Returns the bound port (useful when `port` is 0). Every accepted
/// connection is registered under its remote `"<ip>:<port>"` and serviced
/// by its own receive thread. The loop runs for the life of the process;
/// shutdown is closing the sessions and exiting.
pub fn start_server(
    port: u16,
    registry: Arc<SessionRegistry>,
    handler: Arc<dyn FrameHandler>,
) -> crate::error::Result<u16> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    let bound = listener.local_addr()?.port();
    info!(port = bound, "server listening");

    thread::Builder::new()
        .name("accept".into())
        .spawn(move || accept_loop(listener, registry, handler))?;
    Ok(bound)
}

fn accept_loop(
    listener: TcpListener,
    registry: Arc<SessionRegistry>,
    handler: Arc<dyn FrameHandler>,
) {
    for conn in listener.incoming() {
        let stream = match conn {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        let key = match stream.peer_addr() {
            Ok(addr) => addr.to_string(),
            Err(e) => {
                warn!(error = %e, "peer address unavailable");
                continue;
            }
        };
        info!(peer = %key, "inbound session");
        match Session::new(key, &stream) {
            Ok(session) => {
                let session = Arc::new(session);
                registry.insert(Arc::clone(&session));
                spawn_receive_loop(stream, session, Arc::clone(&registry), Arc::clone(&handler));
            }
            Err(e) => warn!(error = %e, "failed to set up session"),
        }
    }
}
