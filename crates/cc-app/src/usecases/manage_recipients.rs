use std::sync::Arc;

use cc_core::ports::{PublicKeyValidatorPort, RecipientStoreError, RecipientStorePort};
use cc_core::recipient::{
    validate_and_fingerprint, InvalidKeyError, KeyFingerprint, Recipient, MAX_RECIPIENTS,
};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RecipientError {
    #[error(transparent)]
    InvalidKey(#[from] InvalidKeyError),

    #[error(transparent)]
    Store(#[from] RecipientStoreError),

    #[error("recipient {0} not found")]
    NotFound(KeyFingerprint),

    #[error("at most {max} recipients can be selected")]
    SelectionFull { max: usize },
}

/// Use case for managing recipient keys and the selection used for new
/// recordings.
/// 管理接收者公钥以及录制时使用的选中集合。
///
/// The selection is a set keyed by fingerprint.
pub struct ManageRecipients {
    store: Arc<dyn RecipientStorePort>,
    validator: Arc<dyn PublicKeyValidatorPort>,
}

impl ManageRecipients {
    pub fn from_ports(
        store: Arc<dyn RecipientStorePort>,
        validator: Arc<dyn PublicKeyValidatorPort>,
    ) -> Self {
        Self { store, validator }
    }

    pub async fn list(&self) -> Result<Vec<Recipient>, RecipientError> {
        Ok(self.store.list().await?)
    }

    /// Validate, store and select a new recipient.
    ///
    /// The key is stored even when the selection is already full; it is
    /// then left unselected.
    #[tracing::instrument(name = "usecase.recipients.import", skip(self, public_key))]
    pub async fn import(&self, name: &str, public_key: &str) -> Result<Recipient, RecipientError> {
        let recipient = validate_and_fingerprint(name, public_key, self.validator.as_ref())?;
        self.store.import(&recipient).await?;

        match self.select(&recipient.fingerprint()).await {
            Ok(()) => {}
            Err(RecipientError::SelectionFull { max }) => {
                warn!(fingerprint = %recipient.fingerprint(), max, "selection full, imported key left unselected");
            }
            Err(e) => return Err(e),
        }

        info!(fingerprint = %recipient.fingerprint(), "recipient imported");
        Ok(recipient)
    }

    #[tracing::instrument(name = "usecase.recipients.rename", skip(self), fields(fingerprint = %fingerprint))]
    pub async fn rename(
        &self,
        fingerprint: &KeyFingerprint,
        name: &str,
    ) -> Result<Recipient, RecipientError> {
        match self.store.rename(fingerprint, name.trim()).await {
            Ok(recipient) => Ok(recipient),
            Err(RecipientStoreError::NotFound(fp)) => Err(RecipientError::NotFound(fp)),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a recipient and drop it from the selection.
    #[tracing::instrument(name = "usecase.recipients.delete", skip(self), fields(fingerprint = %fingerprint))]
    pub async fn delete(&self, fingerprint: &KeyFingerprint) -> Result<(), RecipientError> {
        self.unselect(fingerprint).await?;
        self.store.delete(fingerprint).await?;
        info!("recipient deleted");
        Ok(())
    }

    pub async fn select(&self, fingerprint: &KeyFingerprint) -> Result<(), RecipientError> {
        if self.store.get(fingerprint).await?.is_none() {
            return Err(RecipientError::NotFound(*fingerprint));
        }

        let mut selected = self.store.load_selected().await?;
        if selected.contains(fingerprint) {
            return Ok(());
        }
        if selected.len() >= MAX_RECIPIENTS {
            return Err(RecipientError::SelectionFull {
                max: MAX_RECIPIENTS,
            });
        }
        selected.push(*fingerprint);
        self.store.save_selected(&selected).await?;
        Ok(())
    }

    pub async fn unselect(&self, fingerprint: &KeyFingerprint) -> Result<(), RecipientError> {
        let mut selected = self.store.load_selected().await?;
        let before = selected.len();
        selected.retain(|fp| fp != fingerprint);
        if selected.len() != before {
            self.store.save_selected(&selected).await?;
        }
        Ok(())
    }

    /// Selected recipients in selection order, ready to pass to a recording.
    pub async fn list_selected(&self) -> Result<Vec<Recipient>, RecipientError> {
        let selected = self.store.load_selected().await?;
        let mut recipients = Vec::with_capacity(selected.len());
        for fingerprint in &selected {
            match self.store.get(fingerprint).await? {
                Some(recipient) => recipients.push(recipient),
                None => warn!(fingerprint = %fingerprint, "selected recipient has no key"),
            }
        }
        Ok(recipients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct AcceptAge;

    impl PublicKeyValidatorPort for AcceptAge {
        fn validate_public_key(&self, public_key: &str) -> Result<(), InvalidKeyError> {
            if public_key.starts_with("age1") {
                Ok(())
            } else {
                Err(InvalidKeyError {
                    reason: "not an age key".to_string(),
                })
            }
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        recipients: Mutex<Vec<Recipient>>,
        selected: Mutex<Vec<KeyFingerprint>>,
    }

    #[async_trait]
    impl RecipientStorePort for MemoryStore {
        async fn list(&self) -> Result<Vec<Recipient>, RecipientStoreError> {
            Ok(self.recipients.lock().unwrap().clone())
        }

        async fn get(
            &self,
            fingerprint: &KeyFingerprint,
        ) -> Result<Option<Recipient>, RecipientStoreError> {
            Ok(self
                .recipients
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.fingerprint() == *fingerprint)
                .cloned())
        }

        async fn import(&self, recipient: &Recipient) -> Result<(), RecipientStoreError> {
            let mut all = self.recipients.lock().unwrap();
            if all.contains(recipient) {
                return Err(RecipientStoreError::AlreadyExists(recipient.fingerprint()));
            }
            all.push(recipient.clone());
            Ok(())
        }

        async fn rename(
            &self,
            fingerprint: &KeyFingerprint,
            name: &str,
        ) -> Result<Recipient, RecipientStoreError> {
            let mut all = self.recipients.lock().unwrap();
            let slot = all
                .iter_mut()
                .find(|r| r.fingerprint() == *fingerprint)
                .ok_or(RecipientStoreError::NotFound(*fingerprint))?;
            *slot = slot.renamed(name);
            Ok(slot.clone())
        }

        async fn delete(&self, fingerprint: &KeyFingerprint) -> Result<(), RecipientStoreError> {
            self.recipients
                .lock()
                .unwrap()
                .retain(|r| r.fingerprint() != *fingerprint);
            Ok(())
        }

        async fn load_selected(&self) -> Result<Vec<KeyFingerprint>, RecipientStoreError> {
            Ok(self.selected.lock().unwrap().clone())
        }

        async fn save_selected(
            &self,
            selected: &[KeyFingerprint],
        ) -> Result<(), RecipientStoreError> {
            *self.selected.lock().unwrap() = selected.to_vec();
            Ok(())
        }
    }

    fn use_case() -> (ManageRecipients, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        (
            ManageRecipients::from_ports(store.clone(), Arc::new(AcceptAge)),
            store,
        )
    }

    #[tokio::test]
    async fn test_import_stores_and_selects() {
        let (uc, store) = use_case();

        let recipient = uc.import(" laptop ", "age1laptop").await.unwrap();

        assert_eq!(recipient.name(), "laptop");
        assert_eq!(store.list().await.unwrap().len(), 1);
        assert_eq!(uc.list_selected().await.unwrap(), vec![recipient]);
    }

    #[tokio::test]
    async fn test_import_rejects_invalid_key() {
        let (uc, store) = use_case();

        let err = uc.import("x", "ssh-ed25519 AAAA").await.unwrap_err();

        assert!(matches!(err, RecipientError::InvalidKey(_)));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_duplicate_key_fails() {
        let (uc, _store) = use_case();
        uc.import("a", "age1same").await.unwrap();

        let err = uc.import("b", "age1same").await.unwrap_err();

        assert!(matches!(
            err,
            RecipientError::Store(RecipientStoreError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_select_is_a_set() {
        let (uc, store) = use_case();
        let r = uc.import("a", "age1a").await.unwrap();

        uc.select(&r.fingerprint()).await.unwrap();
        uc.select(&r.fingerprint()).await.unwrap();

        assert_eq!(store.load_selected().await.unwrap(), vec![r.fingerprint()]);
    }

    #[tokio::test]
    async fn test_selection_is_capped() {
        let (uc, store) = use_case();
        for i in 0..MAX_RECIPIENTS {
            uc.import(&format!("k{i}"), &format!("age1key{i}")).await.unwrap();
        }

        let extra = uc.import("extra", "age1extra").await.unwrap();

        assert_eq!(store.list().await.unwrap().len(), MAX_RECIPIENTS + 1);
        assert_eq!(store.load_selected().await.unwrap().len(), MAX_RECIPIENTS);
        let err = uc.select(&extra.fingerprint()).await.unwrap_err();
        assert!(matches!(err, RecipientError::SelectionFull { max: 20 }));
    }

    #[tokio::test]
    async fn test_delete_also_unselects() {
        let (uc, store) = use_case();
        let a = uc.import("a", "age1a").await.unwrap();
        let b = uc.import("b", "age1b").await.unwrap();

        uc.delete(&a.fingerprint()).await.unwrap();

        assert_eq!(store.load_selected().await.unwrap(), vec![b.fingerprint()]);
        assert_eq!(uc.list().await.unwrap(), vec![b]);
    }

    #[tokio::test]
    async fn test_rename_keeps_identity() {
        let (uc, _store) = use_case();
        let r = uc.import("old", "age1r").await.unwrap();

        let renamed = uc.rename(&r.fingerprint(), "new").await.unwrap();

        assert_eq!(renamed.name(), "new");
        assert_eq!(renamed, r);
        assert_eq!(uc.list_selected().await.unwrap()[0].name(), "new");
    }

    #[tokio::test]
    async fn test_rename_unknown_is_not_found() {
        let (uc, _store) = use_case();
        let ghost = KeyFingerprint::from_public_key("age1ghost");

        let err = uc.rename(&ghost, "x").await.unwrap_err();

        assert!(matches!(err, RecipientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unselect_then_list_selected() {
        let (uc, _store) = use_case();
        let a = uc.import("a", "age1a").await.unwrap();

        uc.unselect(&a.fingerprint()).await.unwrap();

        assert!(uc.list_selected().await.unwrap().is_empty());
        assert_eq!(uc.list().await.unwrap().len(), 1);
    }
}
