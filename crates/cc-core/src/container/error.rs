use thiserror::Error;

/// Errors raised while encoding or decoding the container layout.
#[derive(Debug, Error)]
pub enum FormatError {
    /// More recipients than the one-byte count field can carry.
    #[error("too many recipients: {count} (at most {max} are supported)")]
    TooManyRecipients { count: usize, max: usize },

    /// Metadata does not fit in the 32-bit data offset.
    #[error("metadata of {len} bytes exceeds the representable data offset")]
    MetadataTooLarge { len: usize },

    /// Frame payload does not fit in the 32-bit length field.
    #[error("frame payload of {len} bytes exceeds the 32-bit length field")]
    PayloadTooLarge { len: usize },

    #[error("not a Cryptocam file: bad magic bytes {found:02x?}")]
    BadMagic { found: [u8; 4] },

    #[error("unsupported container version {0}")]
    UnsupportedVersion(u16),

    #[error("unknown file type {0}")]
    UnknownFileType(u8),

    #[error("unknown frame type {0}")]
    UnknownFrameType(u8),

    /// Data offset smaller than the fixed header it must include.
    #[error("invalid data offset {0}")]
    InvalidOffset(u32),

    /// Input ended in the middle of a structure.
    #[error("truncated input while reading {what}")]
    Truncated { what: &'static str },

    #[error("I/O error while reading container: {0}")]
    Io(#[from] std::io::Error),
}
