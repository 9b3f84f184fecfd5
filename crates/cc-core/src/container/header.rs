//! Plaintext discovery header.
//!
//! ```text
//! +--------------------+-------------+-----------+------------------------+
//! | magic 1C 5A 8E 9F  | version u16 | count u8  | count x 16-byte digest |
//! +--------------------+-------------+-----------+------------------------+
//! ```
//!
//! This is the only unencrypted part of a container.

use std::io::Read;

use bytes::BufMut;

use super::{read_exact_or_truncated, FormatError};
use crate::recipient::{KeyFingerprint, FINGERPRINT_LEN, MAX_RECIPIENTS};

/// Magic bytes, matched byte for byte.
pub const MAGIC: [u8; 4] = [0x1C, 0x5A, 0x8E, 0x9F];

/// Current container version.
pub const CONTAINER_VERSION: u16 = 1;

/// magic + version + count
const FIXED_LEN: usize = 4 + 2 + 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryHeader {
    pub version: u16,
    pub recipient_fingerprints: Vec<KeyFingerprint>,
}

impl DiscoveryHeader {
    pub fn encoded_len(&self) -> usize {
        FIXED_LEN + self.recipient_fingerprints.len() * FINGERPRINT_LEN
    }

    /// Whether a key with this fingerprint is listed as a recipient.
    pub fn is_addressed_to(&self, fingerprint: &KeyFingerprint) -> bool {
        self.recipient_fingerprints.contains(fingerprint)
    }
}

/// Encode the discovery header for the given recipients, in order.
pub fn encode_discovery_header(fingerprints: &[KeyFingerprint]) -> Result<Vec<u8>, FormatError> {
    if fingerprints.len() > MAX_RECIPIENTS {
        return Err(FormatError::TooManyRecipients {
            count: fingerprints.len(),
            max: MAX_RECIPIENTS,
        });
    }

    let mut buf = Vec::with_capacity(FIXED_LEN + fingerprints.len() * FINGERPRINT_LEN);
    buf.put_slice(&MAGIC);
    buf.put_u16_le(CONTAINER_VERSION);
    buf.put_u8(fingerprints.len() as u8);
    for fp in fingerprints {
        buf.put_slice(fp.as_bytes());
    }
    Ok(buf)
}

/// Decode a discovery header from the start of `bytes`.
///
/// Returns the header and the number of bytes it occupied.
pub fn decode_discovery_header(bytes: &[u8]) -> Result<(DiscoveryHeader, usize), FormatError> {
    let mut cursor = bytes;
    let header = read_discovery_header(&mut cursor)?;
    Ok((header, bytes.len() - cursor.len()))
}

/// Read a discovery header from a stream, leaving the reader positioned at the
/// first byte of the encrypted stream.
pub fn read_discovery_header<R: Read + ?Sized>(
    reader: &mut R,
) -> Result<DiscoveryHeader, FormatError> {
    let mut fixed = [0u8; FIXED_LEN];
    read_exact_or_truncated(reader, &mut fixed, "discovery header")?;

    let magic = [fixed[0], fixed[1], fixed[2], fixed[3]];
    if magic != MAGIC {
        return Err(FormatError::BadMagic { found: magic });
    }
    let version = u16::from_le_bytes([fixed[4], fixed[5]]);
    if version != CONTAINER_VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }
    let count = fixed[6] as usize;
    if count > MAX_RECIPIENTS {
        return Err(FormatError::TooManyRecipients {
            count,
            max: MAX_RECIPIENTS,
        });
    }

    let mut recipient_fingerprints = Vec::with_capacity(count);
    let mut digest = [0u8; FINGERPRINT_LEN];
    for _ in 0..count {
        read_exact_or_truncated(reader, &mut digest, "recipient fingerprint")?;
        recipient_fingerprints.push(KeyFingerprint::from(digest));
    }

    Ok(DiscoveryHeader {
        version,
        recipient_fingerprints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fingerprints(n: usize) -> Vec<KeyFingerprint> {
        (0..n)
            .map(|i| KeyFingerprint::from_public_key(&format!("age1recipient{i}")))
            .collect()
    }

    #[test]
    fn twenty_recipients_is_the_limit() {
        let bytes = encode_discovery_header(&fingerprints(20)).unwrap();
        assert_eq!(bytes.len(), 7 + 20 * 16);
        assert_eq!(bytes[6], 20);

        let err = encode_discovery_header(&fingerprints(21)).unwrap_err();
        assert!(matches!(
            err,
            FormatError::TooManyRecipients { count: 21, max: 20 }
        ));
    }

    #[test]
    fn layout_is_magic_version_count_digests() {
        let fps = fingerprints(2);
        let bytes = encode_discovery_header(&fps).unwrap();
        assert_eq!(&bytes[0..4], &[0x1C, 0x5A, 0x8E, 0x9F]);
        assert_eq!(&bytes[4..6], &[0x01, 0x00]);
        assert_eq!(bytes[6], 2);
        assert_eq!(&bytes[7..23], fps[0].as_bytes());
        assert_eq!(&bytes[23..39], fps[1].as_bytes());
    }

    #[test]
    fn decode_reports_consumed_length_and_leaves_rest() {
        let fps = fingerprints(3);
        let mut bytes = encode_discovery_header(&fps).unwrap();
        bytes.extend_from_slice(b"age-encryption.org/v1");

        let (header, consumed) = decode_discovery_header(&bytes).unwrap();
        assert_eq!(consumed, 7 + 3 * 16);
        assert_eq!(header.version, 1);
        assert_eq!(header.recipient_fingerprints, fps);
        assert!(header.is_addressed_to(&fps[1]));
        assert_eq!(&bytes[consumed..], b"age-encryption.org/v1");
    }

    #[test]
    fn magic_must_match_exactly() {
        let mut bytes = encode_discovery_header(&fingerprints(1)).unwrap();
        bytes[3] = 0x9E;
        let err = decode_discovery_header(&bytes).unwrap_err();
        assert!(matches!(err, FormatError::BadMagic { .. }));
    }

    #[test]
    fn truncated_digest_list_is_an_error() {
        let bytes = encode_discovery_header(&fingerprints(2)).unwrap();
        let err = decode_discovery_header(&bytes[..30]).unwrap_err();
        assert!(matches!(err, FormatError::Truncated { .. }));

        let err = decode_discovery_header(&bytes[..3]).unwrap_err();
        assert!(matches!(err, FormatError::Truncated { .. }));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut bytes = encode_discovery_header(&fingerprints(1)).unwrap();
        bytes[4] = 2;
        let err = decode_discovery_header(&bytes).unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedVersion(2)));
    }

    proptest! {
        #[test]
        fn magic_and_count_hold_for_any_recipient_list(n in 0usize..=20) {
            let fps = fingerprints(n);
            let bytes = encode_discovery_header(&fps).unwrap();
            prop_assert_eq!(&bytes[0..4], &MAGIC[..]);
            prop_assert_eq!(bytes[6] as usize, n);
            let (header, consumed) = decode_discovery_header(&bytes).unwrap();
            prop_assert_eq!(consumed, bytes.len());
            prop_assert_eq!(header.recipient_fingerprints, fps);
        }
    }
}
