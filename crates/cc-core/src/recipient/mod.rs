//! Recipient identity.
//!
//! A recipient is an X25519 public key plus the fingerprint that lets a key
//! holder discover, without decrypting, that a file was written for them.
//! The display name is presentation metadata only.

mod fingerprint;

use std::hash::{Hash, Hasher};

use serde::Serialize;
use thiserror::Error;

use crate::ports::PublicKeyValidatorPort;

pub use fingerprint::{FingerprintError, KeyFingerprint, FINGERPRINT_LEN};

/// Upper bound imposed by the discovery header's one-byte count field.
pub const MAX_RECIPIENTS: usize = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid recipient public key: {reason}")]
pub struct InvalidKeyError {
    pub reason: String,
}

/// A validated recipient.
///
/// Equality and hashing go through the fingerprint, so renaming a recipient
/// never changes its identity in a set.
#[derive(Debug, Clone, Serialize)]
pub struct Recipient {
    name: String,
    public_key: String,
    fingerprint: KeyFingerprint,
}

impl Recipient {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn fingerprint(&self) -> KeyFingerprint {
        self.fingerprint
    }

    /// Return a copy with a different display name. The fingerprint is kept.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_key: self.public_key.clone(),
            fingerprint: self.fingerprint,
        }
    }
}

impl PartialEq for Recipient {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for Recipient {}

impl Hash for Recipient {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

/// Validate a candidate public key and build a [`Recipient`] from it.
///
/// 校验公钥是否为合法的曲线点，并计算指纹。无副作用。
pub fn validate_and_fingerprint(
    name: &str,
    public_key: &str,
    validator: &dyn PublicKeyValidatorPort,
) -> Result<Recipient, InvalidKeyError> {
    let public_key = public_key.trim();
    if public_key.is_empty() {
        return Err(InvalidKeyError {
            reason: "public key is empty".to_string(),
        });
    }
    validator.validate_public_key(public_key)?;

    Ok(Recipient {
        name: name.trim().to_string(),
        public_key: public_key.to_string(),
        fingerprint: KeyFingerprint::from_public_key(public_key),
    })
}

/// Drop later duplicates (by fingerprint) while keeping the caller's order.
pub fn dedup_by_fingerprint(recipients: Vec<Recipient>) -> Vec<Recipient> {
    let mut seen = std::collections::HashSet::new();
    recipients
        .into_iter()
        .filter(|r| seen.insert(r.fingerprint))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct PrefixValidator;

    impl PublicKeyValidatorPort for PrefixValidator {
        fn validate_public_key(&self, public_key: &str) -> Result<(), InvalidKeyError> {
            if public_key.starts_with("age1") {
                Ok(())
            } else {
                Err(InvalidKeyError {
                    reason: "not an age recipient".to_string(),
                })
            }
        }
    }

    #[test]
    fn valid_key_produces_recipient() {
        let r = validate_and_fingerprint(" laptop ", " age1abc ", &PrefixValidator).unwrap();
        assert_eq!(r.name(), "laptop");
        assert_eq!(r.public_key(), "age1abc");
        assert_eq!(r.fingerprint(), KeyFingerprint::from_public_key("age1abc"));
    }

    #[test]
    fn invalid_key_is_rejected() {
        let err = validate_and_fingerprint("x", "ssh-ed25519 AAAA", &PrefixValidator).unwrap_err();
        assert!(err.reason.contains("not an age recipient"));

        let err = validate_and_fingerprint("x", "   ", &PrefixValidator).unwrap_err();
        assert!(err.reason.contains("empty"));
    }

    #[test]
    fn name_does_not_affect_identity() {
        let a = validate_and_fingerprint("phone", "age1same", &PrefixValidator).unwrap();
        let b = a.renamed("tablet");
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());

        let set: HashSet<Recipient> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let a = validate_and_fingerprint("a", "age1one", &PrefixValidator).unwrap();
        let b = validate_and_fingerprint("b", "age1two", &PrefixValidator).unwrap();
        let a2 = a.renamed("a-again");

        let out = dedup_by_fingerprint(vec![a.clone(), b.clone(), a2]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name(), "a");
        assert_eq!(out[1], b);
    }
}
