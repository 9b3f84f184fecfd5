//! Recording session domain: media descriptions, timestamps, lifecycle states
//! and outcomes.

mod media;
mod outcome;
mod state_machine;
mod status;
mod timestamp;

pub use media::{AudioInfo, InvalidRotation, Rotation, VideoInfo};
pub use outcome::{AbortReason, FinalizationOutcome, FinalizationResult};
pub use state_machine::{
    SessionAction, SessionEvent, SessionState, SessionStateKind, SessionStateMachine,
};
pub use status::SessionStatus;
pub use timestamp::TimestampRebaser;
