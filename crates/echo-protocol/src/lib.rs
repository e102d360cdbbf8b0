//! Wire protocol for Echo peers.
//!
//! Every message on a session is framed as `[len: u32 BE][tag: u8][payload]`
//! where `len` counts the tag byte plus the payload. Payload integers are
//! big-endian; strings are `[u32 len][bytes]`, UTF-8. Chunk digests travel
//! hex-encoded (64 bytes).
//!
//! [`Codec`] turns a [`Message`] into a complete frame and back; the
//! round-trip is lossless for every payload under the 16 MiB frame cap.

pub mod codec;
pub mod error;
pub mod message;

pub use codec::Codec;
pub use error::{ProtocolError, ProtocolResult};
pub use message::{Message, MAX_FRAME_LEN};
