//! # cc-core
//!
//! Core domain of the Cryptocam recorder: recipient identity, the container
//! format, the recording session model and the ports implemented by
//! infrastructure.
//!
//! No filesystem access and no cryptographic primitives live here.

pub mod config;
pub mod container;
pub mod filename;
pub mod ports;
pub mod recipient;
pub mod recording;

pub use config::{RecorderConfig, StorageThresholds};
pub use filename::FilenamePattern;
pub use recipient::{validate_and_fingerprint, InvalidKeyError, KeyFingerprint, Recipient};
pub use recording::{
    AbortReason, AudioInfo, FinalizationOutcome, FinalizationResult, Rotation, SessionState,
    SessionStatus, VideoInfo,
};
