//! Length-prefixed framing.
//!
//! Two framings share one socket over its lifetime:
//!
//! - **pre-auth**: `u32 length | payload`, used while the handshake runs;
//! - **post-auth**: `u32 length | u16 correlation id | payload`, where `length` counts the
//!   correlation id too (`2 + payload.len()`).
//!
//! All integers are big-endian. Headers go through the same fixed-width bincode
//! configuration the rest of the protocol layer uses.
use std::io::{self, Read, Write};

use bincode::{
    Decode, Encode,
    config::{BigEndian, Configuration, Fixint},
};
use log::trace;
use thiserror::Error;

/// Size of the pre-auth header: the length prefix alone.
pub const PREAUTH_HEADER_LEN: usize = 4;
/// Size of the post-auth header: length prefix plus correlation id.
pub const HEADER_LEN: usize = 6;
const CORRELATION_ID_LEN: u32 = 2;

pub(crate) type WireConfig = Configuration<BigEndian, Fixint>;

pub(crate) fn wire_config() -> WireConfig {
    bincode::config::standard()
        .with_big_endian()
        .with_fixed_int_encoding()
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode frame header: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to decode frame header: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("frame too large: max {max_frame_bytes} got {got_bytes}")]
    TooLarge {
        max_frame_bytes: usize,
        got_bytes: usize,
    },
    #[error("malformed frame: {reason}")]
    Malformed { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
struct Header {
    length: u32,
    correlation_id: u16,
}

/// One post-auth frame: routing tag and opaque envelope bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub correlation_id: u16,
    pub payload: Vec<u8>,
}

/// Serialize a post-auth frame into a single contiguous buffer.
pub fn encode_frame(correlation_id: u16, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let length = u32::try_from(payload.len())
        .ok()
        .and_then(|len| len.checked_add(CORRELATION_ID_LEN))
        .ok_or(FrameError::TooLarge {
            max_frame_bytes: (u32::MAX - CORRELATION_ID_LEN) as usize,
            got_bytes: payload.len(),
        })?;

    let mut buf = vec![0u8; HEADER_LEN + payload.len()];
    let header = Header {
        length,
        correlation_id,
    };
    bincode::encode_into_slice(header, &mut buf[..HEADER_LEN], wire_config())?;
    buf[HEADER_LEN..].copy_from_slice(payload);
    Ok(buf)
}

/// Split a post-auth frame body (everything after the length prefix) into its parts.
pub fn decode_body(mut body: Vec<u8>) -> Result<Frame, FrameError> {
    if body.len() < CORRELATION_ID_LEN as usize {
        return Err(FrameError::Malformed {
            reason: format!("frame body of {} bytes has no correlation id", body.len()),
        });
    }
    let (correlation_id, _): (u16, usize) =
        bincode::decode_from_slice(&body[..CORRELATION_ID_LEN as usize], wire_config())?;
    let payload = body.split_off(CORRELATION_ID_LEN as usize);
    Ok(Frame {
        correlation_id,
        payload,
    })
}

/// Write one pre-auth frame and flush it.
pub fn write_preauth<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError> {
    let length = u32::try_from(payload.len()).map_err(|_| FrameError::TooLarge {
        max_frame_bytes: u32::MAX as usize,
        got_bytes: payload.len(),
    })?;
    let mut buf = vec![0u8; PREAUTH_HEADER_LEN + payload.len()];
    bincode::encode_into_slice(length, &mut buf[..PREAUTH_HEADER_LEN], wire_config())?;
    buf[PREAUTH_HEADER_LEN..].copy_from_slice(payload);
    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}

/// Read one pre-auth frame. End of stream anywhere is an error here: the handshake
/// always expects an answer.
pub fn read_preauth<R: Read>(reader: &mut R, max_frame_bytes: usize) -> Result<Vec<u8>, FrameError> {
    let length = read_length(reader)?.ok_or_else(|| {
        FrameError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed during handshake",
        ))
    })?;
    if length > max_frame_bytes {
        return Err(FrameError::TooLarge {
            max_frame_bytes,
            got_bytes: length,
        });
    }
    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

/// Reads the 4-byte length prefix; `None` on a clean end of stream before the first byte.
fn read_length<R: Read>(reader: &mut R) -> Result<Option<usize>, FrameError> {
    let mut prefix = [0u8; PREAUTH_HEADER_LEN];
    let mut read = 0usize;
    while read < prefix.len() {
        let n = match reader.read(&mut prefix[read..]) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            if read == 0 {
                return Ok(None);
            }
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "frame length truncated").into());
        }
        read += n;
    }

    let (length, _): (u32, usize) = bincode::decode_from_slice(&prefix, wire_config())?;
    Ok(Some(length as usize))
}

/// Reads post-auth frames off the read half of a connection.
pub struct FrameReader<R> {
    reader: R,
    max_frame_bytes: usize,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R, max_frame_bytes: usize) -> Self {
        Self {
            reader,
            max_frame_bytes,
        }
    }

    /// Next frame, or `None` once the peer has closed the stream between frames.
    pub fn read_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        let Some(length) = read_length(&mut self.reader)? else {
            return Ok(None);
        };
        if length > self.max_frame_bytes {
            return Err(FrameError::TooLarge {
                max_frame_bytes: self.max_frame_bytes,
                got_bytes: length,
            });
        }

        let mut body = vec![0u8; length];
        self.reader.read_exact(&mut body)?;
        let frame = decode_body(body)?;
        trace!(
            "read frame cid={} payload={}B",
            frame.correlation_id,
            frame.payload.len()
        );
        Ok(Some(frame))
    }
}

/// Writes post-auth frames; each frame goes out as a single buffer.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_frame(&mut self, correlation_id: u16, payload: &[u8]) -> Result<(), FrameError> {
        let frame = encode_frame(correlation_id, payload)?;
        self.writer.write_all(&frame)?;
        self.writer.flush()?;
        trace!("wrote frame cid={correlation_id} payload={}B", payload.len());
        Ok(())
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }
}
