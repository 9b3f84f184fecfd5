use async_trait::async_trait;
use thiserror::Error;

use crate::recipient::{KeyFingerprint, Recipient};

#[derive(Debug, Error)]
pub enum RecipientStoreError {
    #[error("recipient {0} already exists")]
    AlreadyExists(KeyFingerprint),

    #[error("recipient {0} not found")]
    NotFound(KeyFingerprint),

    #[error("recipient store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("recipient store data is corrupt: {0}")]
    Corrupt(String),
}

/// Keyed-file store of recipient public keys plus the persisted selection.
///
/// 每个接收者一个文件，按指纹命名。
#[async_trait]
pub trait RecipientStorePort: Send + Sync {
    /// All stored recipients. Entries that cannot be read are skipped.
    async fn list(&self) -> Result<Vec<Recipient>, RecipientStoreError>;

    async fn get(
        &self,
        fingerprint: &KeyFingerprint,
    ) -> Result<Option<Recipient>, RecipientStoreError>;

    /// Store a new recipient. Fails with `AlreadyExists` for a known fingerprint.
    async fn import(&self, recipient: &Recipient) -> Result<(), RecipientStoreError>;

    /// Change the display name only.
    async fn rename(
        &self,
        fingerprint: &KeyFingerprint,
        name: &str,
    ) -> Result<Recipient, RecipientStoreError>;

    /// Remove a recipient. Removing an unknown fingerprint is not an error.
    async fn delete(&self, fingerprint: &KeyFingerprint) -> Result<(), RecipientStoreError>;

    async fn load_selected(&self) -> Result<Vec<KeyFingerprint>, RecipientStoreError>;

    async fn save_selected(&self, selected: &[KeyFingerprint]) -> Result<(), RecipientStoreError>;
}
