//! State shared between one session's producers, its writer thread and the
//! storage monitor.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use cc_core::ports::{EncoderControlPort, OutputFile};
use cc_core::recording::{AbortReason, AudioInfo, SessionAction, SessionEvent, VideoInfo};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::StatusCell;

/// Queue slots kept free for control messages. Each control message is sent
/// at most once per session.
pub(crate) const CONTROL_SLOTS: usize = 4;

/// What a session records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionKind {
    Video { video: VideoInfo, audio: AudioInfo },
    Image,
}

impl SessionKind {
    pub fn is_video(&self) -> bool {
        matches!(self, SessionKind::Video { .. })
    }
}

#[derive(Debug)]
pub(crate) enum WriterCommand {
    Video { payload: Vec<u8>, pts_us: i64 },
    Audio { payload: Vec<u8>, pts_us: i64 },
    Image { payload: Vec<u8> },
    /// Encoder confirmed it has stopped and flushed.
    RecordingStopped,
    /// Wake-up after the abort flag was set.
    Abort,
    /// `stop()` was called.
    Finish,
}

impl WriterCommand {
    pub(crate) fn uses_frame_slot(&self) -> bool {
        matches!(
            self,
            WriterCommand::Video { .. } | WriterCommand::Audio { .. } | WriterCommand::Image { .. }
        )
    }
}

/// Bounded count of data commands in flight.
pub(crate) struct FrameBudget {
    in_flight: AtomicUsize,
    capacity: usize,
}

impl FrameBudget {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            capacity,
        }
    }

    pub(crate) fn try_acquire(&self) -> bool {
        self.in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.capacity).then_some(n + 1)
            })
            .is_ok()
    }

    pub(crate) fn release(&self) {
        let _ = self
            .in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}

pub(crate) struct SessionShared {
    /// Id handed out by the [`StatusCell`] when this session began.
    id: u64,
    pub(crate) file: OutputFile,
    pub(crate) kind: SessionKind,
    status: Arc<StatusCell>,
    encoder: Option<Arc<dyn EncoderControlPort>>,
    abort: OnceLock<AbortReason>,
    pub(crate) budget: FrameBudget,
    dropped: AtomicU64,
    recording_stopped_sent: AtomicBool,
    finish_sent: AtomicBool,
    finished: AtomicBool,
    control_tx: mpsc::WeakSender<WriterCommand>,
}

impl SessionShared {
    pub(crate) fn new(
        id: u64,
        file: OutputFile,
        kind: SessionKind,
        status: Arc<StatusCell>,
        encoder: Option<Arc<dyn EncoderControlPort>>,
        frame_capacity: usize,
        control_tx: mpsc::WeakSender<WriterCommand>,
    ) -> Self {
        Self {
            id,
            file,
            kind,
            status,
            encoder,
            abort: OnceLock::new(),
            budget: FrameBudget::new(frame_capacity),
            dropped: AtomicU64::new(0),
            recording_stopped_sent: AtomicBool::new(false),
            finish_sent: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            control_tx,
        }
    }

    /// Whether a clean finish must wait for the encoder's stop confirmation.
    pub(crate) fn waits_for_encoder(&self) -> bool {
        self.encoder.is_some() && self.kind.is_video()
    }

    pub(crate) fn abort_reason(&self) -> Option<AbortReason> {
        self.abort.get().cloned()
    }

    /// Apply a status event tagged with this session's id.
    pub(crate) fn apply(&self, event: SessionEvent) -> Vec<SessionAction> {
        self.status.apply_for(self.id, event)
    }

    /// Force the abort path. Only the first reason is kept; a finished
    /// session ignores it.
    pub(crate) fn abort(&self, reason: AbortReason) {
        if self.is_finished() {
            debug!(reason = %reason, "abort after session finished, ignoring");
            return;
        }
        if self.abort.set(reason.clone()).is_err() {
            debug!(reason = %reason, "abort already in progress");
            return;
        }
        let actions = self.apply(SessionEvent::Abort { reason });
        self.perform(&actions);
        self.send_control(WriterCommand::Abort);
    }

    pub(crate) fn perform(&self, actions: &[SessionAction]) {
        for action in actions {
            if let SessionAction::RequestEncoderStop = action {
                if let Some(encoder) = &self.encoder {
                    encoder.request_stop();
                }
            }
        }
    }

    pub(crate) fn request_finish(&self) {
        if !self.finish_sent.swap(true, Ordering::AcqRel) {
            self.send_control(WriterCommand::Finish);
        }
    }

    pub(crate) fn recording_stopped(&self) {
        if self.is_finished() {
            debug!("stop confirmation after session finished, ignoring");
            return;
        }
        if !self.recording_stopped_sent.swap(true, Ordering::AcqRel) {
            self.send_control(WriterCommand::RecordingStopped);
        }
    }

    fn send_control(&self, command: WriterCommand) {
        let Some(tx) = self.control_tx.upgrade() else {
            debug!(command = ?command, "writer already gone");
            return;
        };
        match tx.try_send(command) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Closed(command)) => {
                debug!(command = ?command, "writer already finished");
            }
            Err(mpsc::error::TrySendError::Full(command)) => {
                warn!(command = ?command, "control message not delivered, queue full");
            }
        }
    }

    pub(crate) fn count_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Finished, or on its way there without anyone calling `stop()`.
    pub(crate) fn is_winding_down(&self) -> bool {
        self.is_finished() || self.abort.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_is_bounded_and_released() {
        let budget = FrameBudget::new(2);
        assert!(budget.try_acquire());
        assert!(budget.try_acquire());
        assert!(!budget.try_acquire());
        budget.release();
        assert!(budget.try_acquire());
    }

    #[test]
    fn release_never_underflows() {
        let budget = FrameBudget::new(1);
        budget.release();
        assert!(budget.try_acquire());
        assert!(!budget.try_acquire());
    }
}
