//! Streaming encryption boundary.
//!
//! The cipher itself is a trusted primitive. These traits only describe how
//! the recorder hands it a raw destination and pushes plaintext through it.

use std::io::{self, Write};

use thiserror::Error;

/// Raw writable destination for ciphertext, usually an open file.
pub trait RawSink: Write + Send {
    /// Flush data to durable storage.
    fn sync(&mut self) -> io::Result<()>;
}

impl RawSink for std::fs::File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

impl RawSink for Vec<u8> {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// An open encrypted stream.
///
/// `write` may accept fewer bytes than offered; callers loop.
pub trait CipherStream: Send {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Finish the stream (final authenticated chunk), flush and sync the sink.
    fn close(self: Box<Self>) -> io::Result<()>;
}

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("no encryption key selected")]
    NoRecipients,

    #[error("too many recipients: {count} (at most {max})")]
    TooManyRecipients { count: usize, max: usize },

    #[error("invalid recipient: {reason}")]
    InvalidRecipient { reason: String },

    #[error("failed to open encrypted stream: {0}")]
    Open(#[source] io::Error),

    #[error("failed to write encrypted stream: {0}")]
    Write(#[source] io::Error),

    /// The stream accepted zero bytes of a non-empty buffer.
    #[error("encrypted stream stopped accepting data")]
    WriteZero,

    #[error("failed to close encrypted stream: {0}")]
    Close(#[source] io::Error),
}

/// Multi-recipient streaming encryptor.
pub trait StreamCipherPort: Send + Sync {
    /// Open a stream over `sink`.
    ///
    /// `recipients` is the newline-separated list of recipient public keys.
    fn open(
        &self,
        recipients: &str,
        sink: Box<dyn RawSink>,
    ) -> Result<Box<dyn CipherStream>, CipherError>;
}
