//! Data frames of a video container.
//!
//! ```text
//! frame_type u8 | pts_us i64 LE | payload_len u32 LE | payload
//! ```

use std::io::{self, Read};

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use super::FormatError;

/// frame_type + pts + payload_len
pub const FRAME_HEADER_LEN: usize = 1 + 8 + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameType {
    Video,
    Audio,
}

impl FrameType {
    pub fn as_u8(self) -> u8 {
        match self {
            FrameType::Video => 1,
            FrameType::Audio => 2,
        }
    }
}

impl TryFrom<u8> for FrameType {
    type Error = FormatError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FrameType::Video),
            2 => Ok(FrameType::Audio),
            other => Err(FormatError::UnknownFrameType(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: FrameType,
    /// Presentation timestamp in microseconds, rebased to the session's first frame.
    pub pts_us: i64,
    pub payload: Vec<u8>,
}

/// Encode one frame.
pub fn encode_frame(
    frame_type: FrameType,
    pts_us: i64,
    payload: &[u8],
) -> Result<Vec<u8>, FormatError> {
    let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    encode_frame_into(&mut buf, frame_type, pts_us, payload)?;
    Ok(buf)
}

/// Append one encoded frame to `buf`. Nothing is written on error.
pub fn encode_frame_into(
    buf: &mut Vec<u8>,
    frame_type: FrameType,
    pts_us: i64,
    payload: &[u8],
) -> Result<(), FormatError> {
    let len = u32::try_from(payload.len())
        .map_err(|_| FormatError::PayloadTooLarge { len: payload.len() })?;
    buf.reserve(FRAME_HEADER_LEN + payload.len());
    buf.put_u8(frame_type.as_u8());
    buf.put_i64_le(pts_us);
    buf.put_u32_le(len);
    buf.put_slice(payload);
    Ok(())
}

/// Lazy decoder over a sequence of frames.
///
/// Ends with `None` when the input stops exactly on a frame boundary. A
/// partial frame or an unknown frame type yields one `Err`, after which the
/// stream is fused.
pub struct FrameStream<R> {
    reader: R,
    done: bool,
}

impl<R: Read> FrameStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            done: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, FormatError> {
        let mut header = [0u8; FRAME_HEADER_LEN];
        let filled = fill(&mut self.reader, &mut header)?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < FRAME_HEADER_LEN {
            return Err(FormatError::Truncated {
                what: "frame header",
            });
        }

        let frame_type = FrameType::try_from(header[0])?;
        let mut pts = [0u8; 8];
        pts.copy_from_slice(&header[1..9]);
        let pts_us = i64::from_le_bytes(pts);
        let len = u32::from_le_bytes([header[9], header[10], header[11], header[12]]) as u64;

        let mut payload = Vec::new();
        let read = (&mut self.reader).take(len).read_to_end(&mut payload)?;
        if read as u64 != len {
            return Err(FormatError::Truncated {
                what: "frame payload",
            });
        }

        Ok(Some(Frame {
            frame_type,
            pts_us,
            payload,
        }))
    }
}

impl<R: Read> Iterator for FrameStream<R> {
    type Item = Result<Frame, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Decode frames from an in-memory buffer. Calling it again restarts from the
/// beginning.
pub fn decode_frame_stream(bytes: &[u8]) -> FrameStream<&[u8]> {
    FrameStream::new(bytes)
}

/// Read until `buf` is full or EOF; returns how many bytes were read.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, FormatError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FormatError::Io(e)),
        }
    }
    Ok(filled)
}
