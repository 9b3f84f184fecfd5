use std::fmt;
use std::sync::Arc;

use cc_core::ports::EncoderEvents;
use cc_core::recording::AbortReason;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::session::{SessionShared, WriterCommand};

/// Producer side of one recording session.
///
/// Every method hands off and returns immediately. When the writer queue is
/// full the frame is dropped and counted.
///
/// 生产者句柄：所有方法立即返回，不等待磁盘 I/O。
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
    tx: mpsc::Sender<WriterCommand>,
}

impl SessionHandle {
    pub(crate) fn new(shared: Arc<SessionShared>, tx: mpsc::Sender<WriterCommand>) -> Self {
        Self { shared, tx }
    }

    /// Final name the recording gets if it finishes cleanly.
    pub fn file_name(&self) -> &str {
        &self.shared.file.final_name
    }

    pub fn write_video_frame(&self, payload: Vec<u8>, pts_us: i64) {
        self.enqueue(WriterCommand::Video { payload, pts_us });
    }

    pub fn write_audio_frame(&self, payload: Vec<u8>, pts_us: i64) {
        self.enqueue(WriterCommand::Audio { payload, pts_us });
    }

    /// Raw image bytes for an image session. Written once, without framing.
    pub fn write_image(&self, payload: Vec<u8>) {
        self.enqueue(WriterCommand::Image { payload });
    }

    pub fn recording_stopped(&self) {
        self.shared.recording_stopped();
    }

    pub fn encoder_error(&self, code: i32, message: impl Into<String>) {
        self.shared.abort(AbortReason::EncoderError {
            code,
            message: message.into(),
        });
    }

    /// Frames dropped so far because the writer queue was full.
    pub fn frames_dropped(&self) -> u64 {
        self.shared.dropped()
    }

    fn enqueue(&self, command: WriterCommand) {
        if self.shared.is_winding_down() {
            debug!("session no longer accepts data");
            return;
        }
        if !self.shared.budget.try_acquire() {
            let dropped = self.shared.count_dropped();
            warn!(frames_dropped = dropped, "writer queue full, frame dropped");
            return;
        }
        if let Err(e) = self.tx.try_send(command) {
            self.shared.budget.release();
            debug!(error = %e, "writer closed, frame discarded");
        }
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("file_name", &self.file_name())
            .field("frames_dropped", &self.frames_dropped())
            .finish()
    }
}

impl EncoderEvents for SessionHandle {
    fn on_video_frame(&self, payload: Vec<u8>, pts_us: i64) {
        self.write_video_frame(payload, pts_us);
    }

    fn on_audio_frame(&self, payload: Vec<u8>, pts_us: i64) {
        self.write_audio_frame(payload, pts_us);
    }

    fn on_recording_stopped(&self) {
        self.recording_stopped();
    }

    fn on_encoder_error(&self, code: i32, message: String) {
        self.encoder_error(code, message);
    }
}
