//! Connection registry for Echo.
//!
//! Owns every TCP session between peers. A [`Session`] wraps its socket and
//! a per-session send mutex, so concurrent senders interleave at frame
//! boundaries, never mid-frame. The [`SessionRegistry`] maps
//! `"<ip>:<port>"` keys to sessions and exposes iteration and broadcast so
//! the sync engine never touches a raw socket.
//!
//! Readers run the accept loop ([`server::start_server`]); writers dial
//! ([`dialer::connect_to_peer`], [`dialer::connect_all_readers`]). Every
//! session gets one receive thread that reads frames and hands decoded
//! messages to a [`FrameHandler`].

pub mod dialer;
pub mod error;
pub mod handler;
pub mod recv;
pub mod registry;
pub mod server;
pub mod session;

pub use dialer::{connect_all_readers, connect_to_peer};
pub use error::{NetError, Result};
pub use handler::FrameHandler;
pub use registry::SessionRegistry;
pub use server::start_server;
pub use session::Session;
