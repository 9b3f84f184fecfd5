//! Session state holder.
//!
//! Runs the pure state machine under a lock and publishes every resulting
//! status on a watch channel. Every session gets an id when it begins;
//! events tagged with an older id are dropped.

use std::sync::Mutex;

use cc_core::recording::{
    SessionAction, SessionEvent, SessionState, SessionStateMachine, SessionStatus,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct StatusCell {
    inner: Mutex<Inner>,
    tx: watch::Sender<SessionStatus>,
}

struct Inner {
    state: SessionState,
    status: SessionStatus,
    session: u64,
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusCell {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionStatus::default());
        Self {
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                status: SessionStatus::default(),
                session: 0,
            }),
            tx,
        }
    }

    /// Begin a new session and return its id.
    ///
    /// 开始新会话，返回会话 id。
    pub fn begin_session(&self) -> u64 {
        let mut inner = self.lock();
        inner.session += 1;
        let session = inner.session;
        self.transition(&mut inner, SessionEvent::StartRequested);
        session
    }

    /// Apply an event on behalf of `session`. Status-only actions (warning,
    /// outcome) are handled here; the rest are returned for the caller to
    /// perform. Events from a session that is no longer current are ignored.
    pub fn apply_for(&self, session: u64, event: SessionEvent) -> Vec<SessionAction> {
        let mut inner = self.lock();
        if inner.session != session {
            debug!(session, current = inner.session, event = ?event, "event from stale session ignored");
            return Vec::new();
        }
        self.transition(&mut inner, event)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn transition(&self, inner: &mut Inner, event: SessionEvent) -> Vec<SessionAction> {
        let previous_kind = inner.state.kind();
        let previous = std::mem::replace(&mut inner.state, SessionState::Idle);
        let (next, actions) = SessionStateMachine::transition(previous, event);

        let mut status = inner.status.clone().with_state(&next);
        for action in &actions {
            match action {
                SessionAction::WarnUser { reason } => {
                    warn!(reason = %reason, "recording aborted");
                    status.warning = Some(reason.user_message().to_string());
                }
                SessionAction::ReportOutcome { outcome } => {
                    info!(outcome = ?outcome, "recording finalized");
                    status.last_outcome = Some(outcome.clone());
                }
                SessionAction::RequestEncoderStop => {}
            }
        }
        if matches!(next, SessionState::Opening) {
            status.warning = None;
        }

        if previous_kind != next.kind() {
            debug!(from = ?previous_kind, to = ?next.kind(), "session state changed");
        }
        inner.state = next;
        inner.status = status.clone();
        self.tx.send_replace(status);

        actions
            .into_iter()
            .filter(|a| matches!(a, SessionAction::RequestEncoderStop))
            .collect()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_core::recording::{AbortReason, FinalizationOutcome, SessionStateKind};

    #[test]
    fn abort_sets_warning_and_returns_encoder_stop() {
        let cell = StatusCell::new();
        let id = cell.begin_session();
        cell.apply_for(id, SessionEvent::Opened { started_at_ms: 1 });

        let actions = cell.apply_for(
            id,
            SessionEvent::Abort {
                reason: AbortReason::LowStorage {
                    available_bytes: 10,
                },
            },
        );
        assert_eq!(actions, vec![SessionAction::RequestEncoderStop]);

        let status = cell.status();
        assert_eq!(status.state, SessionStateKind::Finalizing);
        assert_eq!(
            status.warning.as_deref(),
            Some("Recording stopped: storage almost full")
        );
    }

    #[tokio::test]
    async fn subscribers_see_outcome() {
        let cell = StatusCell::new();
        let mut rx = cell.subscribe();
        let id = cell.begin_session();
        cell.apply_for(id, SessionEvent::Opened { started_at_ms: 1 });
        cell.apply_for(id, SessionEvent::StopRequested);
        cell.apply_for(
            id,
            SessionEvent::Finalized {
                outcome: FinalizationOutcome::Success,
            },
        );

        rx.changed().await.unwrap();
        let status = rx.borrow_and_update().clone();
        assert_eq!(status.state, SessionStateKind::Idle);
        assert_eq!(status.last_outcome, Some(FinalizationOutcome::Success));
        assert!(cell.state().is_idle());
    }

    #[test]
    fn new_session_clears_old_warning() {
        let cell = StatusCell::new();
        let id = cell.begin_session();
        cell.apply_for(id, SessionEvent::Opened { started_at_ms: 1 });
        cell.apply_for(
            id,
            SessionEvent::Abort {
                reason: AbortReason::WriteFailed {
                    message: "disk".into(),
                },
            },
        );
        cell.apply_for(
            id,
            SessionEvent::Finalized {
                outcome: FinalizationOutcome::Success,
            },
        );
        assert!(cell.status().warning.is_some());

        cell.begin_session();
        assert!(cell.status().warning.is_none());
    }

    #[test]
    fn events_from_previous_session_are_ignored() {
        let cell = StatusCell::new();
        let old = cell.begin_session();
        cell.apply_for(old, SessionEvent::Opened { started_at_ms: 1 });
        cell.apply_for(old, SessionEvent::StopRequested);
        cell.apply_for(
            old,
            SessionEvent::Finalized {
                outcome: FinalizationOutcome::Success,
            },
        );

        let current = cell.begin_session();
        cell.apply_for(current, SessionEvent::Opened { started_at_ms: 2 });

        let actions = cell.apply_for(
            old,
            SessionEvent::Abort {
                reason: AbortReason::EncoderError {
                    code: 1,
                    message: "late".into(),
                },
            },
        );
        assert!(actions.is_empty());
        cell.apply_for(old, SessionEvent::FrameWritten { media_elapsed_us: 5 });

        let status = cell.status();
        assert_eq!(status.state, SessionStateKind::Streaming);
        assert_eq!(status.frames_written, 0);
        assert!(status.warning.is_none());
    }
}
