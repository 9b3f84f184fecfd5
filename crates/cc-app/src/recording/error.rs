use std::path::PathBuf;

use cc_core::container::FormatError;
use cc_core::ports::{CipherError, StorageError};
use thiserror::Error;

/// Why a session could not start. The session never left `Idle` (or went
/// back to it), and no frames were accepted.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("no encryption key selected")]
    NoRecipients,

    #[error("too many recipients: {count} (at most {max})")]
    TooManyRecipients { count: usize, max: usize },

    #[error("no output directory configured")]
    NoOutputDirectory,

    #[error("output directory {path} is unavailable: {message}")]
    OutputDirectoryUnavailable { path: PathBuf, message: String },

    #[error("insufficient storage: {available} bytes free, {required} required")]
    InsufficientStorage { available: u64, required: u64 },

    #[error("a recording session is already active")]
    SessionActive,

    #[error("file counter unavailable: {0}")]
    Counter(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("metadata encoding failed: {0}")]
    Metadata(String),

    #[error("opening the output failed: {0}")]
    Open(String),
}

impl StartError {
    /// Actionable message for the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            StartError::NoRecipients | StartError::Cipher(CipherError::NoRecipients) => {
                "No encryption key selected"
            }
            StartError::TooManyRecipients { .. }
            | StartError::Cipher(CipherError::TooManyRecipients { .. }) => {
                "Too many encryption keys selected (at most 20)"
            }
            StartError::NoOutputDirectory | StartError::OutputDirectoryUnavailable { .. } => {
                "Select output directory again"
            }
            StartError::InsufficientStorage { .. } => "Insufficient storage",
            StartError::SessionActive => "A recording is already in progress",
            _ => "Could not start recording",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_are_actionable() {
        assert_eq!(
            StartError::NoRecipients.user_message(),
            "No encryption key selected"
        );
        assert_eq!(
            StartError::NoOutputDirectory.user_message(),
            "Select output directory again"
        );
        assert_eq!(
            StartError::InsufficientStorage {
                available: 1,
                required: 2
            }
            .user_message(),
            "Insufficient storage"
        );
        assert_eq!(
            StartError::Counter("x".into()).user_message(),
            "Could not start recording"
        );
    }
}
