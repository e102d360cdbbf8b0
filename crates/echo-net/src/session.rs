use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Mutex;

use echo_protocol::{Codec, Message, ProtocolError, MAX_FRAME_LEN};

use crate::error::{NetError, Result};

/// One connected TCP session, keyed by the remote `"<ip>:<port>"`.
///
/// The write half lives behind a mutex: a frame is written with a single
/// `write_all` under the lock, so frames from different threads interleave
/// only at frame boundaries. The read half is owned by the session's
/// receive thread.
#[derive(Debug)]
pub struct Session {
    key: String,
    writer: Mutex<TcpStream>,
}

impl Session {
    /// Wrap an open stream. Clones the handle for the write half.
    pub fn new(key: String, stream: &TcpStream) -> Result<Self> {
        Ok(Self {
            key,
            writer: Mutex::new(stream.try_clone()?),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Send one message. Holds the session's send mutex for the duration
    /// of the write, so the frame hits the stream contiguously.
    pub fn send(&self, msg: &Message) -> Result<()> {
        let frame = Codec::encode(msg)?;
        let mut stream = self.writer.lock().expect("send mutex poisoned");
        stream.write_all(&frame)?;
        Ok(())
    }

    /// Shut the socket down; the receive thread observes EOF and exits.
    pub fn close(&self) {
        let stream = self.writer.lock().expect("send mutex poisoned");
        let _ = stream.shutdown(Shutdown::Both);
    }
}

/// Read one frame from the stream.
///
/// Returns `Ok(None)` on a clean close at a frame boundary. A suspect
/// length header (zero, or beyond the 16 MiB cap) and a close mid-frame
/// are errors; both are session-fatal.
pub fn read_frame(stream: &mut TcpStream) -> Result<Option<(u8, Vec<u8>)>> {
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len == 0 || len > MAX_FRAME_LEN {
        return Err(NetError::Protocol(ProtocolError::FramingError(format!(
            "suspect frame length {len}"
        ))));
    }
    let mut frame = vec![0u8; len];
    stream.read_exact(&mut frame)?;
    let payload = frame.split_off(1);
    Ok(Some((frame[0], payload)))
}
