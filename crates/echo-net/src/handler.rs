use std::sync::Arc;

use echo_protocol::Message;

use crate::session::Session;

/// Receives every decoded frame from a session's receive thread.
///
/// Frames on one session arrive in order; the handler is called from that
/// session's thread, so a slow handler throttles only its own session.
pub trait FrameHandler: Send + Sync + 'static {
    fn on_message(&self, session: &Arc<Session>, msg: Message);

    /// Called once after the session has been removed from the registry.
    fn on_close(&self, _session: &Arc<Session>) {}
}
