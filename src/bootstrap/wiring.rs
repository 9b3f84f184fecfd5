//! # Dependency Injection / 依赖注入模块
//!
//! Creates the infra adapters and injects them into the app layer.
//!
//! ❌ **No business logic / 禁止包含任何业务逻辑**
//! - Do not decide which recipients a recording uses
//! - 不决定录制使用哪些接收者
//!
//! > **This is the only place allowed to depend on cc-infra and cc-app simultaneously.**
//! > **这是唯一允许同时依赖 cc-infra 和 cc-app 的地方。**

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cc_app::recording::{RecordingDeps, RecordingSessionWriter};
use cc_app::usecases::{ManageRecipients, ScanIncompleteRecordings};
use cc_core::config::RecorderConfig;
use cc_core::ports::PublicKeyValidatorPort;
use cc_infra::{
    AgeStreamCipher, FileCounterStore, FileRecipientStore, FsOutputStore, SysinfoStorageSpace,
    SystemClock,
};
use tracing::info;

/// Result type for wiring operations
pub type WiringResult<T> = Result<T, WiringError>;

/// Errors during dependency injection
/// 依赖注入错误（基础设施初始化失败）
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("Platform data directory is unknown")]
    DataDirUnknown,

    #[error("State directory initialization failed: {path}: {source}")]
    StateInit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Wired recorder: the session writer plus the use cases around it.
pub struct Recorder {
    pub writer: Arc<RecordingSessionWriter>,
    pub recipients: Arc<ManageRecipients>,
    pub incomplete: Arc<ScanIncompleteRecordings>,
}

/// Base data directory used when the config leaves key or state paths empty.
pub fn default_data_dir() -> WiringResult<PathBuf> {
    dirs::data_local_dir()
        .map(|dir| dir.join("cryptocam"))
        .ok_or(WiringError::DataDirUnknown)
}

/// Wire the recorder with the platform data directory as fallback base.
pub fn wire_recorder(config: RecorderConfig) -> WiringResult<Recorder> {
    let needs_base =
        config.keys_dir.as_os_str().is_empty() || config.state_dir.as_os_str().is_empty();
    let base = if needs_base {
        default_data_dir()?
    } else {
        PathBuf::new()
    };
    wire_recorder_in(config, &base)
}

/// Wire the recorder, resolving empty key/state paths under `data_dir`.
/// 组装录制器；空的 keys/state 路径放在 `data_dir` 下。
pub fn wire_recorder_in(mut config: RecorderConfig, data_dir: &Path) -> WiringResult<Recorder> {
    if config.keys_dir.as_os_str().is_empty() {
        config.keys_dir = data_dir.join("keys");
    }
    if config.state_dir.as_os_str().is_empty() {
        config.state_dir = data_dir.join("state");
    }
    for dir in [&config.keys_dir, &config.state_dir] {
        std::fs::create_dir_all(dir).map_err(|source| WiringError::StateInit {
            path: dir.clone(),
            source,
        })?;
    }

    let cipher = Arc::new(AgeStreamCipher::new());
    let validator: Arc<dyn PublicKeyValidatorPort> = cipher.clone();
    let output_store = Arc::new(FsOutputStore::new());

    let recipient_store = Arc::new(FileRecipientStore::new(
        config.keys_dir.clone(),
        config.state_dir.clone(),
        validator.clone(),
    ));
    let deps = RecordingDeps {
        cipher,
        output_store: output_store.clone(),
        storage_space: Arc::new(SysinfoStorageSpace::new()),
        counter: Arc::new(FileCounterStore::new(config.state_dir.clone())),
        clock: Arc::new(SystemClock),
    };

    info!(
        keys_dir = %config.keys_dir.display(),
        state_dir = %config.state_dir.display(),
        output_dir = ?config.output_dir,
        "recorder wired"
    );

    Ok(Recorder {
        writer: Arc::new(RecordingSessionWriter::new(deps, config)),
        recipients: Arc::new(ManageRecipients::from_ports(recipient_store, validator)),
        incomplete: Arc::new(ScanIncompleteRecordings::from_ports(output_store)),
    })
}
