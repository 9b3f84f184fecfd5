//! Keyed-file recipient store.
//!
//! ```text
//! <keys_dir>/<hex fingerprint>.txt     "# <name>\n<public key>\n"
//! <state_dir>/selected.json            ["<hex fingerprint>", ...]
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cc_core::ports::{PublicKeyValidatorPort, RecipientStoreError, RecipientStorePort};
use cc_core::recipient::{validate_and_fingerprint, KeyFingerprint, Recipient};
use tracing::{debug, warn};

use super::atomic_write;

const KEY_FILE_EXTENSION: &str = "txt";

pub struct FileRecipientStore {
    keys_dir: PathBuf,
    selected_path: PathBuf,
    validator: Arc<dyn PublicKeyValidatorPort>,
}

impl FileRecipientStore {
    pub fn new(
        keys_dir: PathBuf,
        state_dir: PathBuf,
        validator: Arc<dyn PublicKeyValidatorPort>,
    ) -> Self {
        Self {
            keys_dir,
            selected_path: state_dir.join("selected.json"),
            validator,
        }
    }

    fn key_path(&self, fingerprint: &KeyFingerprint) -> PathBuf {
        self.keys_dir
            .join(format!("{}.{KEY_FILE_EXTENSION}", fingerprint.to_hex()))
    }

    fn render(recipient: &Recipient) -> String {
        format!("# {}\n{}\n", recipient.name(), recipient.public_key())
    }

    /// Parse a key file. The name comment is optional.
    fn parse(&self, content: &str) -> Result<Recipient, RecipientStoreError> {
        let mut name = "";
        let mut key = None;
        for line in content.lines().map(str::trim) {
            if let Some(comment) = line.strip_prefix('#') {
                if key.is_none() && name.is_empty() {
                    name = comment.trim();
                }
            } else if !line.is_empty() && key.is_none() {
                key = Some(line);
            }
        }
        let key = key.ok_or_else(|| RecipientStoreError::Corrupt("no public key".into()))?;
        validate_and_fingerprint(name, key, self.validator.as_ref())
            .map_err(|e| RecipientStoreError::Corrupt(e.to_string()))
    }

    async fn read_key_file(&self, path: &Path) -> Result<Recipient, RecipientStoreError> {
        let content = tokio::fs::read_to_string(path).await?;
        self.parse(&content)
    }

    async fn write_key_file(&self, recipient: &Recipient) -> Result<(), RecipientStoreError> {
        atomic_write(
            &self.key_path(&recipient.fingerprint()),
            Self::render(recipient).as_bytes(),
        )
        .await
        .map_err(|e| RecipientStoreError::Io(io::Error::other(format!("{e:#}"))))
    }
}

#[async_trait]
impl RecipientStorePort for FileRecipientStore {
    async fn list(&self) -> Result<Vec<Recipient>, RecipientStoreError> {
        let mut entries = match tokio::fs::read_dir(&self.keys_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(KEY_FILE_EXTENSION) {
                continue;
            }
            match self.read_key_file(&path).await {
                Ok(recipient) => out.push(recipient),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable key file"),
            }
        }
        out.sort_by(|a, b| a.name().cmp(b.name()).then(a.fingerprint().cmp(&b.fingerprint())));
        Ok(out)
    }

    async fn get(
        &self,
        fingerprint: &KeyFingerprint,
    ) -> Result<Option<Recipient>, RecipientStoreError> {
        let path = self.key_path(fingerprint);
        match self.read_key_file(&path).await {
            Ok(recipient) => Ok(Some(recipient)),
            Err(RecipientStoreError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn import(&self, recipient: &Recipient) -> Result<(), RecipientStoreError> {
        let path = self.key_path(&recipient.fingerprint());
        if tokio::fs::try_exists(&path).await? {
            return Err(RecipientStoreError::AlreadyExists(recipient.fingerprint()));
        }
        self.write_key_file(recipient).await?;
        debug!(fingerprint = %recipient.fingerprint(), "recipient imported");
        Ok(())
    }

    async fn rename(
        &self,
        fingerprint: &KeyFingerprint,
        name: &str,
    ) -> Result<Recipient, RecipientStoreError> {
        let existing = self
            .get(fingerprint)
            .await?
            .ok_or(RecipientStoreError::NotFound(*fingerprint))?;
        let renamed = existing.renamed(name.trim());
        self.write_key_file(&renamed).await?;
        Ok(renamed)
    }

    async fn delete(&self, fingerprint: &KeyFingerprint) -> Result<(), RecipientStoreError> {
        match tokio::fs::remove_file(self.key_path(fingerprint)).await {
            Ok(()) => {
                debug!(fingerprint = %fingerprint, "recipient deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_selected(&self) -> Result<Vec<KeyFingerprint>, RecipientStoreError> {
        let content = match tokio::fs::read_to_string(&self.selected_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let stored: Vec<KeyFingerprint> = serde_json::from_str(&content)
            .map_err(|e| RecipientStoreError::Corrupt(e.to_string()))?;

        let mut selected = Vec::with_capacity(stored.len());
        for fp in stored {
            if selected.contains(&fp) {
                continue;
            }
            if tokio::fs::try_exists(self.key_path(&fp)).await? {
                selected.push(fp);
            } else {
                debug!(fingerprint = %fp, "dropping selection without key file");
            }
        }
        Ok(selected)
    }

    async fn save_selected(&self, selected: &[KeyFingerprint]) -> Result<(), RecipientStoreError> {
        let json = serde_json::to_vec_pretty(selected)
            .map_err(|e| RecipientStoreError::Corrupt(e.to_string()))?;
        atomic_write(&self.selected_path, &json)
            .await
            .map_err(|e| RecipientStoreError::Io(io::Error::other(format!("{e:#}"))))
    }
}
