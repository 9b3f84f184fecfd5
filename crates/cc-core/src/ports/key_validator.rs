use crate::recipient::InvalidKeyError;

/// Checks that a public key string is a well-formed recipient for the
/// configured key-agreement curve.
pub trait PublicKeyValidatorPort: Send + Sync {
    fn validate_public_key(&self, public_key: &str) -> Result<(), InvalidKeyError>;
}
