//! Single writer of one session's encrypted stream.
//!
//! Runs on a blocking thread and owns the [`EncryptedOutput`] exclusively.
//! Producers only ever reach it through the bounded command queue.

use std::path::PathBuf;
use std::sync::Arc;

use cc_core::container::{encode_frame_into, FrameType};
use cc_core::ports::OutputStorePort;
use cc_core::recording::{
    AbortReason, FinalizationOutcome, FinalizationResult, SessionEvent, TimestampRebaser,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::session::{SessionShared, WriterCommand};
use super::EncryptedOutput;

pub(crate) struct SessionWorker {
    rx: mpsc::Receiver<WriterCommand>,
    output: EncryptedOutput,
    store: Arc<dyn OutputStorePort>,
    shared: Arc<SessionShared>,
    rebaser: TimestampRebaser,
    frames_written: u64,
    image_written: bool,
    frame_buf: Vec<u8>,
}

impl SessionWorker {
    pub(crate) fn new(
        rx: mpsc::Receiver<WriterCommand>,
        output: EncryptedOutput,
        store: Arc<dyn OutputStorePort>,
        shared: Arc<SessionShared>,
    ) -> Self {
        Self {
            rx,
            output,
            store,
            shared,
            rebaser: TimestampRebaser::new(),
            frames_written: 0,
            image_written: false,
            frame_buf: Vec::new(),
        }
    }

    /// Process commands until the session is finalized.
    pub(crate) fn run(mut self) -> FinalizationResult {
        let mut finish_requested = false;

        loop {
            if self.shared.abort_reason().is_some() {
                return self.finalize();
            }

            let Some(command) = self.rx.blocking_recv() else {
                return self.finalize_abandoned();
            };
            if command.uses_frame_slot() {
                self.shared.budget.release();
            }

            match command {
                WriterCommand::Video { payload, pts_us } => {
                    self.write_frame(FrameType::Video, &payload, pts_us);
                }
                WriterCommand::Audio { payload, pts_us } => {
                    self.write_frame(FrameType::Audio, &payload, pts_us);
                }
                WriterCommand::Image { payload } => self.write_image(&payload),
                WriterCommand::RecordingStopped => {
                    debug!(finish_requested, "encoder reported stop");
                    return self.finalize();
                }
                WriterCommand::Abort => continue,
                WriterCommand::Finish => {
                    if !self.shared.waits_for_encoder() {
                        return self.finalize();
                    }
                    // Keep draining until the encoder confirms its stop.
                    finish_requested = true;
                }
            }
        }
    }

    fn write_frame(&mut self, frame_type: FrameType, payload: &[u8], pts_us: i64) {
        if self.shared.abort_reason().is_some() {
            return;
        }
        if !self.shared.kind.is_video() {
            warn!(?frame_type, "frame sent to an image session, ignoring");
            return;
        }

        let rebased = self.rebaser.rebase(pts_us);
        self.frame_buf.clear();
        if let Err(e) = encode_frame_into(&mut self.frame_buf, frame_type, rebased, payload) {
            // Oversized payloads are a caller bug; the stream itself is intact.
            error!(error = %e, len = payload.len(), "frame rejected");
            return;
        }

        match self.output.write_all(&self.frame_buf) {
            Ok(()) => {
                self.frames_written += 1;
                self.shared.apply(SessionEvent::FrameWritten {
                    media_elapsed_us: self.rebaser.elapsed_us(),
                });
            }
            Err(e) => {
                error!(error = %e, frames_written = self.frames_written, "frame write failed");
                self.shared.abort(AbortReason::WriteFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    fn write_image(&mut self, payload: &[u8]) {
        if self.shared.abort_reason().is_some() {
            return;
        }
        if self.shared.kind.is_video() {
            warn!("image payload sent to a video session, ignoring");
            return;
        }
        if self.image_written {
            warn!("image payload already written, ignoring");
            return;
        }

        match self.output.write_all(payload) {
            Ok(()) => {
                self.image_written = true;
                debug!(bytes = payload.len(), "image payload written");
            }
            Err(e) => {
                error!(error = %e, "image write failed");
                self.shared.abort(AbortReason::WriteFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    /// Writer handle and every producer are gone without a stop.
    fn finalize_abandoned(self) -> FinalizationResult {
        warn!(file = %self.shared.file.final_name, "session abandoned without stop");
        self.finish_with(Some("session abandoned without stop".to_string()))
    }

    fn finalize(self) -> FinalizationResult {
        self.finish_with(None)
    }

    fn finish_with(self, abandoned: Option<String>) -> FinalizationResult {
        let SessionWorker {
            rx,
            output,
            store,
            shared,
            rebaser,
            frames_written,
            ..
        } = self;
        // Anything still queued is discarded.
        drop(rx);

        let close_result = output.close();
        let abort = shared.abort_reason();

        let mut outcome = match (abort, close_result, abandoned) {
            (Some(reason), close_result, _) => {
                if let Err(e) = close_result {
                    warn!(error = %e, "closing stream after abort also failed");
                }
                FinalizationOutcome::Aborted(reason)
            }
            (None, Err(e), _) => FinalizationOutcome::Corrupted {
                cause: e.to_string(),
            },
            (None, Ok(()), Some(cause)) => FinalizationOutcome::Corrupted { cause },
            (None, Ok(()), None) => FinalizationOutcome::Success,
        };

        let path: PathBuf = if outcome.is_success() {
            match store.publish(&shared.file) {
                Ok(path) => path,
                Err(e) => {
                    error!(error = %e, "publishing recording failed");
                    outcome = FinalizationOutcome::Corrupted {
                        cause: e.to_string(),
                    };
                    mark_corrupted(store.as_ref(), &shared)
                }
            }
        } else {
            mark_corrupted(store.as_ref(), &shared)
        };

        let result = FinalizationResult {
            outcome: outcome.clone(),
            path,
            frames_written,
            frames_dropped: shared.dropped(),
            media_duration_us: rebaser.elapsed_us(),
        };
        info!(
            session_file = %result.path.display(),
            frames_written = result.frames_written,
            frames_dropped = result.frames_dropped,
            success = result.is_success(),
            "session finalized"
        );

        shared.apply(SessionEvent::Finalized { outcome });
        shared.mark_finished();
        result
    }
}

/// Corrupted marker, or the busy name if even that rename fails.
fn mark_corrupted(store: &dyn OutputStorePort, shared: &SessionShared) -> PathBuf {
    match store.mark_corrupted(&shared.file) {
        Ok(path) => path,
        Err(e) => {
            warn!(error = %e, "marking recording corrupted failed, leaving busy name");
            shared.file.busy_path.clone()
        }
    }
}
