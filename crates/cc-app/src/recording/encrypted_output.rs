//! Encryptor integration.
//!
//! Joins recipient keys into the cipher's list form, pushes whole buffers
//! through a stream that may accept partial writes, and closes the stream
//! exactly once on every exit path.

use std::io;

use cc_core::ports::{CipherError, CipherStream, RawSink, StreamCipherPort};
use cc_core::recipient::{Recipient, MAX_RECIPIENTS};
use tracing::warn;

pub struct EncryptedOutput {
    stream: Option<Box<dyn CipherStream>>,
    bytes_written: u64,
}

impl EncryptedOutput {
    /// Recipient keys are handed to the cipher newline-separated.
    pub fn recipient_list(recipients: &[Recipient]) -> String {
        recipients
            .iter()
            .map(Recipient::public_key)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn open(
        cipher: &dyn StreamCipherPort,
        recipients: &[Recipient],
        sink: Box<dyn RawSink>,
    ) -> Result<Self, CipherError> {
        if recipients.is_empty() {
            return Err(CipherError::NoRecipients);
        }
        if recipients.len() > MAX_RECIPIENTS {
            return Err(CipherError::TooManyRecipients {
                count: recipients.len(),
                max: MAX_RECIPIENTS,
            });
        }

        let stream = cipher.open(&Self::recipient_list(recipients), sink)?;
        Ok(Self {
            stream: Some(stream),
            bytes_written: 0,
        })
    }

    /// Write the whole buffer, looping over partial writes.
    pub fn write_all(&mut self, mut buf: &[u8]) -> Result<(), CipherError> {
        let stream = self.stream.as_mut().ok_or_else(|| {
            CipherError::Write(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "encrypted stream already closed",
            ))
        })?;

        while !buf.is_empty() {
            match stream.write(buf) {
                Ok(0) => return Err(CipherError::WriteZero),
                Ok(n) => {
                    buf = &buf[n..];
                    self.bytes_written += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(CipherError::Write(e)),
            }
        }
        Ok(())
    }

    /// Plaintext bytes accepted so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn close(mut self) -> Result<(), CipherError> {
        self.close_once()
    }

    fn close_once(&mut self) -> Result<(), CipherError> {
        match self.stream.take() {
            Some(stream) => stream.close().map_err(CipherError::Close),
            None => Ok(()),
        }
    }
}

impl Drop for EncryptedOutput {
    fn drop(&mut self) {
        if self.stream.is_some() {
            if let Err(e) = self.close_once() {
                warn!(error = %e, "closing abandoned encrypted stream failed");
            }
        }
    }
}
