//! Cryptocam recorder application orchestration layer.
//!
//! This crate contains the recording session writer and the use cases that
//! sit on top of the core ports.

pub mod recording;
pub mod usecases;

pub use recording::{
    RecordingDeps, RecordingSessionWriter, SessionHandle, SessionKind, StartError, StartRequest,
};
pub use usecases::{ManageRecipients, RecipientError, ScanIncompleteRecordings};
