//! Encoder pipeline boundary.

/// Control handle into the encoder pipeline, used to ask it to flush and
/// stop producing. The pipeline answers through
/// [`EncoderEvents::on_recording_stopped`].
pub trait EncoderControlPort: Send + Sync {
    fn request_stop(&self);
}

/// Callbacks the encoder pipeline invokes.
///
/// Implementations must return promptly: they run on the encoders' own
/// real-time threads and never wait for disk I/O.
///
/// 编码器回调接口，实现方不得阻塞。
pub trait EncoderEvents: Send + Sync {
    fn on_video_frame(&self, payload: Vec<u8>, pts_us: i64);

    fn on_audio_frame(&self, payload: Vec<u8>, pts_us: i64);

    /// The encoder has fully stopped and flushed everything it produced.
    fn on_recording_stopped(&self);

    fn on_encoder_error(&self, code: i32, message: String);
}
