//! Self-describing frame header
//!
//! A binary frame may carry its own stream id so it does not depend on a
//! preceding `frame` priming message:
//!
//! ```text
//! +--------+-----+-------------------+-----------------+
//! | "FRLY" | len | stream id (len B) | payload ...     |
//! +--------+-----+-------------------+-----------------+
//! ```
//!
//! `len` is a single byte in `1..=255`; the id must be UTF-8.

use bytes::{BufMut, Bytes, BytesMut};

/// Magic prefix of a self-describing frame
pub const FRAME_MAGIC: &[u8; 4] = b"FRLY";

/// Maximum stream id length that fits in the header
pub const MAX_HEADER_ID_LEN: usize = u8::MAX as usize;

/// Split an embedded stream id off a frame payload.
///
/// Returns `None` for the id (and the payload untouched) when the payload has
/// no valid header.
pub fn split_header(payload: Bytes) -> (Option<String>, Bytes) {
    let magic_len = FRAME_MAGIC.len();
    if payload.len() <= magic_len || &payload[..magic_len] != FRAME_MAGIC {
        return (None, payload);
    }

    let id_len = payload[magic_len] as usize;
    let id_start = magic_len + 1;
    let id_end = id_start + id_len;
    if id_len == 0 || payload.len() < id_end {
        return (None, payload);
    }

    match std::str::from_utf8(&payload[id_start..id_end]) {
        Ok(id) => {
            let id = id.to_string();
            (Some(id), payload.slice(id_end..))
        }
        Err(_) => (None, payload),
    }
}

/// Prepend a self-describing header to a payload.
///
/// Returns `None` if the id is empty or longer than [`MAX_HEADER_ID_LEN`].
pub fn encode_header(stream_id: &str, payload: &[u8]) -> Option<Bytes> {
    let id = stream_id.as_bytes();
    if id.is_empty() || id.len() > MAX_HEADER_ID_LEN {
        return None;
    }

    let mut buf = BytesMut::with_capacity(FRAME_MAGIC.len() + 1 + id.len() + payload.len());
    buf.put_slice(FRAME_MAGIC);
    buf.put_u8(id.len() as u8);
    buf.put_slice(id);
    buf.put_slice(payload);
    Some(buf.freeze())
}

/// Prepend a fixed content-type prefix to a relayed frame
pub fn with_prefix(prefix: Option<&Bytes>, payload: Bytes) -> Bytes {
    match prefix {
        Some(prefix) if !prefix.is_empty() => {
            let mut buf = BytesMut::with_capacity(prefix.len() + payload.len());
            buf.put_slice(prefix);
            buf.put_slice(&payload);
            buf.freeze()
        }
        _ => payload,
    }
}
