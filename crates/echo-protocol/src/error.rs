use thiserror::Error;

/// Errors produced while encoding or decoding protocol messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame header is unusable; the session should be closed.
    #[error("framing error: {0}")]
    FramingError(String),

    /// Frame exceeds the 16 MiB cap.
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// Tag byte does not name a known message.
    #[error("unknown message type: {0}")]
    UnknownType(u8),

    /// Payload ended before a field was complete.
    #[error("truncated payload: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    /// A field was present but unusable (bad UTF-8 path, bad hex digest).
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Convenience alias used throughout the protocol crate.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
