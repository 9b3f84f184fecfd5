//! age (X25519 + ChaCha20-Poly1305 STREAM) adapter.
//!
//! age 流式加密适配器：每个接收者一个 X25519 stanza，负载按 64 KiB 分块认证加密。

use std::io::{self, Write};
use std::str::FromStr;

use age::x25519;
use cc_core::ports::{CipherError, CipherStream, PublicKeyValidatorPort, RawSink, StreamCipherPort};
use cc_core::recipient::{InvalidKeyError, MAX_RECIPIENTS};
use tracing::debug;

/// Stream cipher backed by the `age` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct AgeStreamCipher;

impl AgeStreamCipher {
    pub fn new() -> Self {
        Self
    }

    fn parse_recipients(
        recipients: &str,
    ) -> Result<Vec<Box<dyn age::Recipient + Send>>, CipherError> {
        recipients
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                x25519::Recipient::from_str(line)
                    .map(|r| Box::new(r) as Box<dyn age::Recipient + Send>)
                    .map_err(|reason| CipherError::InvalidRecipient {
                        reason: reason.to_string(),
                    })
            })
            .collect()
    }
}

impl PublicKeyValidatorPort for AgeStreamCipher {
    fn validate_public_key(&self, public_key: &str) -> Result<(), InvalidKeyError> {
        x25519::Recipient::from_str(public_key.trim())
            .map(|_| ())
            .map_err(|reason| InvalidKeyError {
                reason: reason.to_string(),
            })
    }
}

impl StreamCipherPort for AgeStreamCipher {
    fn open(
        &self,
        recipients: &str,
        sink: Box<dyn RawSink>,
    ) -> Result<Box<dyn CipherStream>, CipherError> {
        let parsed = Self::parse_recipients(recipients)?;
        if parsed.is_empty() {
            return Err(CipherError::NoRecipients);
        }
        if parsed.len() > MAX_RECIPIENTS {
            return Err(CipherError::TooManyRecipients {
                count: parsed.len(),
                max: MAX_RECIPIENTS,
            });
        }
        let count = parsed.len();

        let encryptor = age::Encryptor::with_recipients(parsed).ok_or(CipherError::NoRecipients)?;
        let writer = encryptor
            .wrap_output(sink)
            .map_err(|e| CipherError::Open(io::Error::other(e.to_string())))?;
        debug!(recipients = count, "age stream opened");

        Ok(Box::new(AgeStream { writer }))
    }
}

struct AgeStream {
    writer: age::stream::StreamWriter<Box<dyn RawSink>>,
}

impl CipherStream for AgeStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        let mut sink = self.writer.finish()?;
        sink.flush()?;
        sink.sync()
    }
}
