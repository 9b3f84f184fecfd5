//! Recipient key fingerprints.
//!
//! 接收者公钥指纹。
//!
//! # Design / 设计
//!
//! ```text
//! public_key (age1..., UTF-8)
//!   -> SHA-256(public_key bytes)
//!   -> last 16 bytes
//!   -> KeyFingerprint (written into the plaintext discovery header)
//! ```
//!
//! The fingerprint depends on the public key string only. The recipient's
//! display name never enters the digest.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Fingerprint length in bytes.
pub const FINGERPRINT_LEN: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("Invalid fingerprint length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid fingerprint encoding: {0}")]
    InvalidEncoding(String),
}

/// 16-byte recipient fingerprint.
///
/// Serialized as lowercase hex so it can double as a file name and a
/// settings value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyFingerprint([u8; FINGERPRINT_LEN]);

impl KeyFingerprint {
    /// Compute the fingerprint of a public key string.
    ///
    /// 取 SHA-256(public_key) 的后 16 字节。
    pub fn from_public_key(public_key: &str) -> Self {
        let digest = Sha256::digest(public_key.as_bytes());
        let mut out = [0u8; FINGERPRINT_LEN];
        out.copy_from_slice(&digest[digest.len() - FINGERPRINT_LEN..]);
        Self(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FingerprintError> {
        let array: [u8; FINGERPRINT_LEN] =
            bytes
                .try_into()
                .map_err(|_| FingerprintError::InvalidLength {
                    expected: FINGERPRINT_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; FINGERPRINT_LEN]> for KeyFingerprint {
    fn from(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for KeyFingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes =
            hex::decode(s.trim()).map_err(|e| FingerprintError::InvalidEncoding(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl TryFrom<String> for KeyFingerprint {
    type Error = FingerprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyFingerprint> for String {
    fn from(fp: KeyFingerprint) -> Self {
        fp.to_hex()
    }
}

impl fmt::Display for KeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for KeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyFingerprint({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    const KEY: &str = "age1ql3z7hjy54pw3hyww5ayyfg7zqgvc7w3j2elw8zmrj2kg5sfn9aqmcac8p";

    #[test]
    fn fingerprint_is_last_sixteen_bytes_of_sha256() {
        let digest = Sha256::digest(KEY.as_bytes());
        let fp = KeyFingerprint::from_public_key(KEY);
        assert_eq!(fp.as_bytes(), &digest[16..32]);
    }

    #[test]
    fn hex_round_trip() {
        let fp = KeyFingerprint::from_public_key(KEY);
        let parsed: KeyFingerprint = fp.to_hex().parse().unwrap();
        assert_eq!(parsed, fp);
        assert_eq!(fp.to_hex().len(), 32);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = KeyFingerprint::from_bytes(&[0u8; 15]).unwrap_err();
        assert_eq!(
            err,
            FingerprintError::InvalidLength {
                expected: 16,
                actual: 15
            }
        );
        assert!("abcd".parse::<KeyFingerprint>().is_err());
        assert!("zz".repeat(16).parse::<KeyFingerprint>().is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let fp = KeyFingerprint::from_public_key(KEY);
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", fp.to_hex()));
        let back: KeyFingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }

    #[test]
    fn no_collisions_across_random_sample() {
        let mut seen = HashSet::new();
        for i in 0..20_000u32 {
            let key = format!("age1sample{i:08}");
            assert!(seen.insert(KeyFingerprint::from_public_key(&key)));
        }
    }

    proptest! {
        #[test]
        fn fingerprint_is_deterministic(key in "[a-z0-9]{1,80}") {
            prop_assert_eq!(
                KeyFingerprint::from_public_key(&key),
                KeyFingerprint::from_public_key(&key)
            );
        }

        #[test]
        fn distinct_keys_do_not_collide(a in "age1[a-z0-9]{58}", b in "age1[a-z0-9]{58}") {
            prop_assume!(a != b);
            prop_assert_ne!(KeyFingerprint::from_public_key(&a), KeyFingerprint::from_public_key(&b));
        }
    }
}
