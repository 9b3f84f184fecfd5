//! Cryptocam recorder library.
//!
//! The embedding application loads a [`RecorderConfig`], initializes tracing
//! once, and wires the recorder:
//!
//! ```ignore
//! cryptocam::bootstrap::tracing::init_tracing_subscriber()?;
//! let config = cryptocam::bootstrap::load_config(path)?;
//! let recorder = cryptocam::bootstrap::wire_recorder(config)?;
//! let recipients = recorder.recipients.list_selected().await?;
//! let handle = recorder.writer.start_video(video, audio, recipients, Some(encoder)).await?;
//! ```

pub mod bootstrap;

pub use cc_app::recording::{RecordingSessionWriter, SessionHandle, StartError};
pub use cc_core::{
    AbortReason, AudioInfo, FinalizationOutcome, FinalizationResult, Recipient, RecorderConfig,
    Rotation, SessionStatus, VideoInfo,
};
