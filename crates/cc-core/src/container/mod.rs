//! Cryptocam container layout.
//!
//! ```text
//! [discovery header]              plaintext
//! [age stream ..................] encrypted
//!   [metadata header]
//!   [frame][frame]...             video
//!   [raw image bytes]             image
//! ```
//!
//! Every multi-byte integer is little-endian. The magic is a byte literal.

mod error;
mod frame;
mod header;
mod metadata;

use std::io::{self, Read};

pub use error::FormatError;
pub use frame::{
    decode_frame_stream, encode_frame, encode_frame_into, Frame, FrameStream, FrameType,
    FRAME_HEADER_LEN,
};
pub use header::{
    decode_discovery_header, encode_discovery_header, read_discovery_header, DiscoveryHeader,
    CONTAINER_VERSION, MAGIC,
};
pub use metadata::{
    decode_metadata_header, encode_metadata_header, read_metadata_header, ContainerMetadata,
    FileType, ImageMetadata, MetadataHeader, VideoMetadata, MAX_METADATA_LEN,
    METADATA_PREFIX_LEN,
};

/// `read_exact` that reports a short read as [`FormatError::Truncated`].
pub(crate) fn read_exact_or_truncated<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    what: &'static str,
) -> Result<(), FormatError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => FormatError::Truncated { what },
        _ => FormatError::Io(e),
    })
}
