use bytes::{Buf, BufMut};

use echo_types::{digest::HEX_LEN, ChunkDigest};

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{Message, MAX_FRAME_LEN};

/// Codec for Echo protocol frames.
///
/// Framing: `[len: u32 BE][tag: u8][payload: len-1 bytes]`.
pub struct Codec;

impl Codec {
    /// Encode a message as a complete frame.
    pub fn encode(msg: &Message) -> ProtocolResult<Vec<u8>> {
        let payload = Self::encode_payload(msg);
        let len = payload.len() + 1;
        if len > MAX_FRAME_LEN {
            return Err(ProtocolError::MessageTooLarge {
                size: len,
                max: MAX_FRAME_LEN,
            });
        }
        let mut buf = Vec::with_capacity(4 + len);
        buf.put_u32(len as u32);
        buf.put_u8(msg.type_tag());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Encode the payload only (no length or tag).
    pub fn encode_payload(msg: &Message) -> Vec<u8> {
        let mut out = Vec::new();
        match msg {
            Message::FileDesc {
                path,
                version,
                size,
                chunk_size,
                hashes,
            } => {
                put_str(&mut out, path);
                out.put_u64(*version);
                out.put_u64(*size);
                out.put_u32(*chunk_size);
                out.put_u32(hashes.len() as u32);
                for h in hashes {
                    put_str(&mut out, &h.to_hex());
                }
            }
            Message::GetChunks { path, indices } => {
                put_str(&mut out, path);
                out.put_u32(indices.len() as u32);
                for idx in indices {
                    out.put_u32(*idx);
                }
            }
            Message::PutChunk { path, index, data } => {
                put_str(&mut out, path);
                out.put_u32(*index);
                out.put_u32(data.len() as u32);
                out.extend_from_slice(data);
            }
            Message::OpenNotepad { path } => {
                put_str(&mut out, path);
            }
        }
        out
    }

    /// Decode one frame from the front of `data`. Returns the message and
    /// the number of bytes consumed.
    pub fn decode(data: &[u8]) -> ProtocolResult<(Message, usize)> {
        if data.len() < 5 {
            return Err(ProtocolError::FramingError("frame too short".into()));
        }
        let len = u32::from_be_bytes(data[0..4].try_into().expect("4-byte slice")) as usize;
        if len == 0 {
            return Err(ProtocolError::FramingError("zero-length frame".into()));
        }
        if len > MAX_FRAME_LEN {
            return Err(ProtocolError::MessageTooLarge {
                size: len,
                max: MAX_FRAME_LEN,
            });
        }
        let total = 4 + len;
        if data.len() < total {
            return Err(ProtocolError::FramingError(format!(
                "incomplete frame: have {}, need {}",
                data.len(),
                total
            )));
        }
        let msg = Self::decode_payload(data[4], &data[5..total])?;
        Ok((msg, total))
    }

    /// Decode a frame body given its tag byte.
    ///
    /// Bytes past the last field are ignored, matching the lenient parsers
    /// on the wire today.
    pub fn decode_payload(tag: u8, payload: &[u8]) -> ProtocolResult<Message> {
        let mut buf = payload;
        match tag {
            1 => {
                let path = get_str(&mut buf)?;
                let version = get_u64(&mut buf)?;
                let size = get_u64(&mut buf)?;
                let chunk_size = get_u32(&mut buf)?;
                let n_hashes = get_u32(&mut buf)?;
                let mut hashes = Vec::new();
                for _ in 0..n_hashes {
                    let hx = get_str(&mut buf)?;
                    if hx.len() != HEX_LEN {
                        return Err(ProtocolError::InvalidPayload(format!(
                            "digest length {} (expected {HEX_LEN})",
                            hx.len()
                        )));
                    }
                    let digest = ChunkDigest::from_hex(&hx)
                        .map_err(|e| ProtocolError::InvalidPayload(e.to_string()))?;
                    hashes.push(digest);
                }
                Ok(Message::FileDesc {
                    path,
                    version,
                    size,
                    chunk_size,
                    hashes,
                })
            }
            2 => {
                let path = get_str(&mut buf)?;
                let n_idx = get_u32(&mut buf)?;
                let mut indices = Vec::new();
                for _ in 0..n_idx {
                    indices.push(get_u32(&mut buf)?);
                }
                Ok(Message::GetChunks { path, indices })
            }
            3 => {
                let path = get_str(&mut buf)?;
                let index = get_u32(&mut buf)?;
                let data_len = get_u32(&mut buf)? as usize;
                let data = get_bytes(&mut buf, data_len)?;
                Ok(Message::PutChunk { path, index, data })
            }
            4 => {
                let path = get_str(&mut buf)?;
                Ok(Message::OpenNotepad { path })
            }
            other => Err(ProtocolError::UnknownType(other)),
        }
    }
}

fn put_str(out: &mut Vec<u8>, s: &str) {
    out.put_u32(s.len() as u32);
    out.extend_from_slice(s.as_bytes());
}

fn get_u32(buf: &mut &[u8]) -> ProtocolResult<u32> {
    if buf.remaining() < 4 {
        return Err(ProtocolError::Truncated {
            need: 4,
            have: buf.remaining(),
        });
    }
    Ok(buf.get_u32())
}

fn get_u64(buf: &mut &[u8]) -> ProtocolResult<u64> {
    if buf.remaining() < 8 {
        return Err(ProtocolError::Truncated {
            need: 8,
            have: buf.remaining(),
        });
    }
    Ok(buf.get_u64())
}

fn get_bytes(buf: &mut &[u8], n: usize) -> ProtocolResult<Vec<u8>> {
    if buf.remaining() < n {
        return Err(ProtocolError::Truncated {
            need: n,
            have: buf.remaining(),
        });
    }
    let mut out = vec![0u8; n];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

fn get_str(buf: &mut &[u8]) -> ProtocolResult<String> {
    let len = get_u32(buf)? as usize;
    let bytes = get_bytes(buf, len)?;
    String::from_utf8(bytes).map_err(|e| ProtocolError::InvalidPayload(e.to_string()))
}
