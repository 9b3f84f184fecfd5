use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a session left the clean stop path.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbortReason {
    #[error("storage almost full ({available_bytes} bytes left)")]
    LowStorage { available_bytes: u64 },

    #[error("encoder error {code}: {message}")]
    EncoderError { code: i32, message: String },

    #[error("write to encrypted stream failed: {message}")]
    WriteFailed { message: String },
}

impl AbortReason {
    /// Short warning shown to the user when a recording is cut off.
    pub fn user_message(&self) -> &'static str {
        match self {
            AbortReason::LowStorage { .. } => "Recording stopped: storage almost full",
            AbortReason::EncoderError { .. } => "Recording stopped: encoder error",
            AbortReason::WriteFailed { .. } => "Recording stopped: could not write file",
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalizationOutcome {
    /// Stream closed cleanly and the file carries its final name.
    Success,
    /// Clean stop requested, but the stream did not close cleanly.
    Corrupted { cause: String },
    /// Session was cut short.
    Aborted(AbortReason),
}

impl FinalizationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FinalizationOutcome::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizationResult {
    pub outcome: FinalizationOutcome,
    /// Where the file ended up: final name on success, otherwise a
    /// corrupted- or busy-marked name.
    pub path: PathBuf,
    pub frames_written: u64,
    /// Frames refused by a full writer queue.
    pub frames_dropped: u64,
    pub media_duration_us: i64,
}

impl FinalizationResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}
