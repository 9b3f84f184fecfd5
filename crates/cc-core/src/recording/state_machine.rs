//! Recording session state machine.
//!
//! Pure transition function; the caller performs the returned actions.
//!
//! ```text
//! Idle -> Opening -> Streaming -> Finalizing -> Idle
//!                        |             |
//!                        +--> Aborting +--> Idle
//! ```

use serde::{Deserialize, Serialize};

use super::{AbortReason, FinalizationOutcome};

/// Session state.
///
/// 会话状态。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    /// File created, stream being opened.
    ///
    /// 正在创建文件并打开加密流。
    Opening,
    /// Frames are being accepted.
    ///
    /// 正在写入帧。
    Streaming {
        started_at_ms: i64,
        frame_count: u64,
        media_elapsed_us: i64,
    },
    /// Clean stop in progress. Queued frames are still being drained.
    ///
    /// 正常停止中。
    Finalizing {
        frame_count: u64,
        media_elapsed_us: i64,
    },
    /// Cut short; the file will be flagged corrupted.
    ///
    /// 中止中，文件将被标记为损坏。
    Aborting {
        reason: AbortReason,
        frame_count: u64,
        media_elapsed_us: i64,
    },
}

/// State kind exposed to UI layers. `Aborting` is reported as `Finalizing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStateKind {
    Idle,
    Opening,
    Streaming,
    Finalizing,
}

impl SessionState {
    pub fn kind(&self) -> SessionStateKind {
        match self {
            SessionState::Idle => SessionStateKind::Idle,
            SessionState::Opening => SessionStateKind::Opening,
            SessionState::Streaming { .. } => SessionStateKind::Streaming,
            SessionState::Finalizing { .. } | SessionState::Aborting { .. } => {
                SessionStateKind::Finalizing
            }
        }
    }

    /// Frames written and media time so far, for states that carry them.
    pub fn progress(&self) -> Option<(u64, i64)> {
        match self {
            SessionState::Streaming {
                frame_count,
                media_elapsed_us,
                ..
            }
            | SessionState::Finalizing {
                frame_count,
                media_elapsed_us,
            }
            | SessionState::Aborting {
                frame_count,
                media_elapsed_us,
                ..
            } => Some((*frame_count, *media_elapsed_us)),
            SessionState::Idle | SessionState::Opening => None,
        }
    }

    fn with_frame(self, elapsed: i64) -> Self {
        match self {
            SessionState::Streaming {
                started_at_ms,
                frame_count,
                media_elapsed_us,
            } => SessionState::Streaming {
                started_at_ms,
                frame_count: frame_count + 1,
                media_elapsed_us: media_elapsed_us.max(elapsed),
            },
            SessionState::Finalizing {
                frame_count,
                media_elapsed_us,
            } => SessionState::Finalizing {
                frame_count: frame_count + 1,
                media_elapsed_us: media_elapsed_us.max(elapsed),
            },
            SessionState::Aborting {
                reason,
                frame_count,
                media_elapsed_us,
            } => SessionState::Aborting {
                reason,
                frame_count: frame_count + 1,
                media_elapsed_us: media_elapsed_us.max(elapsed),
            },
            other => other,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }
}

/// Events that drive a session.
///
/// 驱动会话的事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    StartRequested,
    Opened { started_at_ms: i64 },
    OpenFailed,
    FrameWritten { media_elapsed_us: i64 },
    StopRequested,
    Abort { reason: AbortReason },
    Finalized { outcome: FinalizationOutcome },
}

/// Side-effects produced by transitions.
///
/// 状态迁移产生的副作用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Ask the encoder pipeline to flush and stop producing.
    RequestEncoderStop,
    /// Surface a warning to the user.
    WarnUser { reason: AbortReason },
    /// Publish the outcome of the session that just ended.
    ReportOutcome { outcome: FinalizationOutcome },
}

/// Pure session state machine.
///
/// 纯状态机：不包含副作用。
pub struct SessionStateMachine;

impl SessionStateMachine {
    pub fn transition(
        state: SessionState,
        event: SessionEvent,
    ) -> (SessionState, Vec<SessionAction>) {
        match (state, event) {
            (SessionState::Idle, SessionEvent::StartRequested) => {
                (SessionState::Opening, Vec::new())
            }
            (SessionState::Opening, SessionEvent::Opened { started_at_ms }) => (
                SessionState::Streaming {
                    started_at_ms,
                    frame_count: 0,
                    media_elapsed_us: 0,
                },
                Vec::new(),
            ),
            (SessionState::Opening, SessionEvent::OpenFailed) => (SessionState::Idle, Vec::new()),
            // Frames drained after a stop or abort still count.
            (
                state @ (SessionState::Streaming { .. }
                | SessionState::Finalizing { .. }
                | SessionState::Aborting { .. }),
                SessionEvent::FrameWritten { media_elapsed_us },
            ) => (state.with_frame(media_elapsed_us), Vec::new()),
            (
                SessionState::Streaming {
                    frame_count,
                    media_elapsed_us,
                    ..
                },
                SessionEvent::StopRequested,
            ) => (
                SessionState::Finalizing {
                    frame_count,
                    media_elapsed_us,
                },
                vec![SessionAction::RequestEncoderStop],
            ),
            (
                SessionState::Streaming {
                    frame_count,
                    media_elapsed_us,
                    ..
                },
                SessionEvent::Abort { reason },
            ) => (
                SessionState::Aborting {
                    reason: reason.clone(),
                    frame_count,
                    media_elapsed_us,
                },
                vec![
                    SessionAction::RequestEncoderStop,
                    SessionAction::WarnUser { reason },
                ],
            ),
            // Encoder failure before it confirmed the stop.
            (
                SessionState::Finalizing {
                    frame_count,
                    media_elapsed_us,
                },
                SessionEvent::Abort { reason },
            ) => (
                SessionState::Aborting {
                    reason: reason.clone(),
                    frame_count,
                    media_elapsed_us,
                },
                vec![SessionAction::WarnUser { reason }],
            ),
            (
                SessionState::Finalizing { .. } | SessionState::Aborting { .. },
                SessionEvent::Finalized { outcome },
            ) => (
                SessionState::Idle,
                vec![SessionAction::ReportOutcome { outcome }],
            ),
            // A writer can fail on its own before anyone asked it to stop.
            (SessionState::Streaming { .. }, SessionEvent::Finalized { outcome }) => (
                SessionState::Idle,
                vec![SessionAction::ReportOutcome { outcome }],
            ),
            (state, _) => (state, Vec::new()),
        }
    }
}
