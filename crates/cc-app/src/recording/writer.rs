//! Recording session writer.
//!
//! ```text
//! start():  check recipients / output dir / free space
//!           -> busy file -> discovery header -> age stream -> metadata header
//!           -> spawn writer thread + storage monitor
//! frames:   SessionHandle --try_send--> bounded queue --> writer thread
//! stop():   ask encoder to stop -> Finish -> drain -> close -> rename
//! ```
//!
//! At most one session is active. `start` and `stop` are serialized on one
//! lock, so a new session always begins after the previous one finalized.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use cc_core::config::RecorderConfig;
use cc_core::container::{encode_discovery_header, ContainerMetadata, ImageMetadata, VideoMetadata};
use cc_core::filename::FilenamePattern;
use cc_core::ports::{
    ClockPort, EncoderControlPort, FileCounterPort, OutputFile, OutputStorePort, StorageError,
    StorageSpacePort, StreamCipherPort,
};
use cc_core::recipient::{dedup_by_fingerprint, Recipient, MAX_RECIPIENTS};
use cc_core::recording::{
    AudioInfo, FinalizationOutcome, FinalizationResult, SessionEvent, SessionStatus, VideoInfo,
};
use chrono::{Local, NaiveDateTime};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::session::{SessionShared, WriterCommand, CONTROL_SLOTS};
use super::worker::SessionWorker;
use super::{EncryptedOutput, SessionHandle, SessionKind, StartError, StatusCell, StorageGuard};

/// Frame slots used when the configuration leaves the capacity at 0.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Upper bound on configured frame slots.
pub const MAX_QUEUE_CAPACITY: usize = 65_536;

/// Frame slots for a configured capacity: 0 means the default, anything
/// above [`MAX_QUEUE_CAPACITY`] is clamped.
pub fn effective_queue_capacity(configured: usize) -> usize {
    match configured {
        0 => DEFAULT_QUEUE_CAPACITY,
        n => n.min(MAX_QUEUE_CAPACITY),
    }
}

/// Ports the writer depends on.
#[derive(Clone)]
pub struct RecordingDeps {
    pub cipher: Arc<dyn StreamCipherPort>,
    pub output_store: Arc<dyn OutputStorePort>,
    pub storage_space: Arc<dyn StorageSpacePort>,
    pub counter: Arc<dyn FileCounterPort>,
    pub clock: Arc<dyn ClockPort>,
}

pub struct StartRequest {
    pub kind: SessionKind,
    pub recipients: Vec<Recipient>,
    /// Encoder pipeline to stop on `stop()` or abort. With an encoder, a
    /// clean stop waits for its `on_recording_stopped`.
    pub encoder: Option<Arc<dyn EncoderControlPort>>,
}

struct ActiveSession {
    shared: Arc<SessionShared>,
    worker: JoinHandle<FinalizationResult>,
    monitor: JoinHandle<()>,
    monitor_shutdown: watch::Sender<bool>,
    // Keeps the queue open while no producer handle is alive.
    _tx: mpsc::Sender<WriterCommand>,
}

impl ActiveSession {
    async fn join(self) -> FinalizationResult {
        let ActiveSession {
            shared,
            worker,
            monitor,
            monitor_shutdown,
            _tx,
        } = self;
        drop(_tx);

        let result = match worker.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "writer task failed");
                let outcome = FinalizationOutcome::Corrupted {
                    cause: format!("writer task failed: {e}"),
                };
                shared.apply(SessionEvent::Finalized {
                    outcome: outcome.clone(),
                });
                shared.mark_finished();
                FinalizationResult {
                    outcome,
                    path: shared.file.busy_path.clone(),
                    frames_written: 0,
                    frames_dropped: shared.dropped(),
                    media_duration_us: 0,
                }
            }
        };

        let _ = monitor_shutdown.send(true);
        if let Err(e) = monitor.await {
            warn!(error = %e, "storage monitor task failed");
        }
        result
    }
}

pub struct RecordingSessionWriter {
    deps: RecordingDeps,
    config: RwLock<RecorderConfig>,
    status: Arc<StatusCell>,
    active: Mutex<Option<ActiveSession>>,
}

impl RecordingSessionWriter {
    pub fn new(deps: RecordingDeps, config: RecorderConfig) -> Self {
        Self {
            deps,
            config: RwLock::new(config),
            status: Arc::new(StatusCell::new()),
            active: Mutex::new(None),
        }
    }

    /// Replace the configuration. Sessions already running keep the
    /// snapshot taken at their start.
    pub fn update_config(&self, config: RecorderConfig) {
        match self.config.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }

    pub fn config(&self) -> RecorderConfig {
        match self.config.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status.status()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    pub async fn start_video(
        &self,
        video: VideoInfo,
        audio: AudioInfo,
        recipients: Vec<Recipient>,
        encoder: Option<Arc<dyn EncoderControlPort>>,
    ) -> Result<SessionHandle, StartError> {
        self.start(StartRequest {
            kind: SessionKind::Video { video, audio },
            recipients,
            encoder,
        })
        .await
    }

    pub async fn start_image(&self, recipients: Vec<Recipient>) -> Result<SessionHandle, StartError> {
        self.start(StartRequest {
            kind: SessionKind::Image,
            recipients,
            encoder: None,
        })
        .await
    }

    pub async fn start(&self, request: StartRequest) -> Result<SessionHandle, StartError> {
        let span = info_span!(
            "usecase.recording.start",
            video = request.kind.is_video(),
            recipients = request.recipients.len()
        );

        async move {
            let mut active = self.active.lock().await;
            if let Some(previous) = active.take() {
                if previous.shared.is_winding_down() {
                    let result = previous.join().await;
                    debug!(outcome = ?result.outcome, "previous session reaped");
                } else {
                    *active = Some(previous);
                    return Err(StartError::SessionActive);
                }
            }

            let config = self.config();
            let recipients = dedup_by_fingerprint(request.recipients);
            if recipients.is_empty() {
                return Err(StartError::NoRecipients);
            }
            if recipients.len() > MAX_RECIPIENTS {
                return Err(StartError::TooManyRecipients {
                    count: recipients.len(),
                    max: MAX_RECIPIENTS,
                });
            }
            let dir = config
                .output_dir
                .clone()
                .ok_or(StartError::NoOutputDirectory)?;
            let guard = StorageGuard::new(self.deps.storage_space.clone(), config.thresholds);
            guard.check_can_start(&dir)?;

            let session_id = self.status.begin_session();
            let started_at_ms = self.deps.clock.now_ms();
            let (file, output) = match self
                .open_session(&config, dir.clone(), recipients, &request.kind, started_at_ms)
                .await
            {
                Ok(opened) => opened,
                Err(e) => {
                    error!(error = %e, "recording start failed");
                    self.status.apply_for(session_id, SessionEvent::OpenFailed);
                    return Err(e);
                }
            };

            let capacity = effective_queue_capacity(config.queue_capacity);
            let (tx, rx) = mpsc::channel(capacity + CONTROL_SLOTS);
            let shared = Arc::new(SessionShared::new(
                session_id,
                file,
                request.kind,
                self.status.clone(),
                request.encoder,
                capacity,
                tx.downgrade(),
            ));
            shared.apply(SessionEvent::Opened { started_at_ms });

            let worker = SessionWorker::new(
                rx,
                output,
                self.deps.output_store.clone(),
                shared.clone(),
            );
            let worker = tokio::task::spawn_blocking(move || worker.run());
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let monitor = guard.spawn_monitor(dir, shared.clone(), shutdown_rx);

            info!(
                session_file = %shared.file.busy_path.display(),
                queue_capacity = capacity,
                "recording started"
            );
            let handle = SessionHandle::new(shared.clone(), tx.clone());
            *active = Some(ActiveSession {
                shared,
                worker,
                monitor,
                monitor_shutdown: shutdown_tx,
                _tx: tx,
            });
            Ok(handle)
        }
        .instrument(span)
        .await
    }

    /// Stop the active session and wait until its file is finalized.
    ///
    /// Returns `None` when no session is active, including a repeated stop.
    pub async fn stop(&self) -> Option<FinalizationResult> {
        let span = info_span!("usecase.recording.stop");

        async {
            let mut active = self.active.lock().await;
            let Some(session) = active.take() else {
                debug!("stop without active session");
                return None;
            };

            let actions = session.shared.apply(SessionEvent::StopRequested);
            session.shared.perform(&actions);
            session.shared.request_finish();

            Some(session.join().await)
        }
        .instrument(span)
        .await
    }

    async fn open_session(
        &self,
        config: &RecorderConfig,
        dir: PathBuf,
        recipients: Vec<Recipient>,
        kind: &SessionKind,
        started_at_ms: i64,
    ) -> Result<(OutputFile, EncryptedOutput), StartError> {
        let number = self
            .deps
            .counter
            .next()
            .await
            .map_err(|e| StartError::Counter(format!("{e:#}")))?;
        let now = local_time(started_at_ms);
        let name = FilenamePattern::new(config.filename_pattern.clone()).render(
            now,
            number,
            Uuid::new_v4(),
        );

        let timestamp = now.format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
        let metadata = match kind {
            SessionKind::Video { video, audio } => {
                let mut metadata = VideoMetadata::new(timestamp, video, audio);
                if metadata.codec.is_empty() {
                    metadata.codec = config.codec.clone();
                }
                ContainerMetadata::Video(metadata)
            }
            SessionKind::Image => ContainerMetadata::Image(ImageMetadata::jpg(timestamp)),
        };
        let header = metadata
            .encode_header()
            .map_err(|e| StartError::Metadata(format!("{e:#}")))?;

        let cipher = self.deps.cipher.clone();
        let store = self.deps.output_store.clone();
        tokio::task::spawn_blocking(move || {
            create_output(cipher.as_ref(), store.as_ref(), &dir, &name, &recipients, &header)
        })
        .await
        .map_err(|e| StartError::Open(e.to_string()))?
    }
}

/// Busy file, discovery header, encrypted stream and metadata header.
/// Runs on a blocking thread.
fn create_output(
    cipher: &dyn StreamCipherPort,
    store: &dyn OutputStorePort,
    dir: &Path,
    name: &str,
    recipients: &[Recipient],
    metadata_header: &[u8],
) -> Result<(OutputFile, EncryptedOutput), StartError> {
    let (file, mut sink) = store.create_busy(dir, name).map_err(|e| match e {
        StorageError::DirectoryUnavailable { path, source } => {
            StartError::OutputDirectoryUnavailable {
                path,
                message: source.to_string(),
            }
        }
        other => StartError::Storage(other),
    })?;

    // From here on a failure leaves the busy file in place.
    let fingerprints: Vec<_> = recipients.iter().map(Recipient::fingerprint).collect();
    let discovery = encode_discovery_header(&fingerprints)?;
    sink.write_all(&discovery)
        .and_then(|()| sink.flush())
        .map_err(|e| StartError::OutputDirectoryUnavailable {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut output = EncryptedOutput::open(cipher, recipients, sink)?;
    output.write_all(metadata_header)?;

    debug!(file = %file.final_name, recipients = recipients.len(), "session opened");
    Ok((file, output))
}

fn local_time(ms: i64) -> NaiveDateTime {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|utc| utc.with_timezone(&Local).naive_local())
        .unwrap_or_else(|| Local::now().naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_capacity_defaults_and_clamps() {
        assert_eq!(effective_queue_capacity(0), DEFAULT_QUEUE_CAPACITY);
        assert_eq!(effective_queue_capacity(64), 64);
        assert_eq!(effective_queue_capacity(usize::MAX), MAX_QUEUE_CAPACITY);
        assert!(effective_queue_capacity(usize::MAX)
            .checked_add(CONTROL_SLOTS)
            .is_some());
    }
}
