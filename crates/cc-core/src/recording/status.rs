use std::time::Duration;

use serde::Serialize;

use super::{FinalizationOutcome, SessionState, SessionStateKind};

/// Snapshot of the recorder exposed to UI layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub state: SessionStateKind,
    /// Elapsed recording time on the media clock.
    pub elapsed: Duration,
    pub frames_written: u64,
    pub last_outcome: Option<FinalizationOutcome>,
    /// Warning raised by the last abort, if any.
    pub warning: Option<String>,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            state: SessionStateKind::Idle,
            elapsed: Duration::ZERO,
            frames_written: 0,
            last_outcome: None,
            warning: None,
        }
    }
}

impl SessionStatus {
    /// Refresh the state-derived fields, keeping outcome and warning.
    pub fn with_state(mut self, state: &SessionState) -> Self {
        self.state = state.kind();
        if let Some((frame_count, media_elapsed_us)) = state.progress() {
            self.frames_written = frame_count;
            self.elapsed = Duration::from_micros(media_elapsed_us.max(0) as u64);
        } else if matches!(state, SessionState::Opening) {
            self.frames_written = 0;
            self.elapsed = Duration::ZERO;
        }
        self
    }
}
