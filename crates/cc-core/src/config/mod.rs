//! # Pure Data Module / 纯数据模块
//!
//! Recorder configuration DTOs. TOML is mapped onto plain fields without
//! validation; missing values become empty facts that the application layer
//! interprets.
//!
//! 只做 TOML → DTO 映射，不做校验。

use std::path::PathBuf;

/// Storage thresholds of the low-storage guard.
///
/// These are fixed constants, not part of the TOML surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageThresholds {
    /// Free bytes required before a session may start.
    pub min_to_start: u64,
    /// Free bytes below which an active session is aborted.
    pub critical_during_recording: u64,
    pub poll_interval_ms: u64,
}

impl StorageThresholds {
    pub const DEFAULT: StorageThresholds = StorageThresholds {
        min_to_start: 100 * 1024 * 1024,
        critical_during_recording: 50 * 1024 * 1024,
        poll_interval_ms: 200,
    };
}

impl Default for StorageThresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Recorder configuration DTO (pure data, no logic)
/// 录制配置 DTO（纯数据，无逻辑）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Output directory. `None` means the user never picked one.
    /// 输出目录，`None` 表示尚未选择。
    pub output_dir: Option<PathBuf>,

    /// File name pattern (may be empty - the writer falls back to its default)
    pub filename_pattern: String,

    /// Codec identifier written into video metadata
    pub codec: String,

    /// Directory holding one key file per recipient
    pub keys_dir: PathBuf,

    /// Directory for recorder state (file counter, selected recipients)
    pub state_dir: PathBuf,

    /// Writer queue capacity in frames (0 = application default)
    pub queue_capacity: usize,

    pub thresholds: StorageThresholds,
}

impl RecorderConfig {
    /// Create RecorderConfig from TOML value
    /// 从 TOML 值创建 RecorderConfig
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let str_at = |section: &str, key: &str| -> Option<String> {
            toml_value
                .get(section)
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        Ok(Self {
            output_dir: str_at("output", "directory")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            filename_pattern: str_at("output", "filename_pattern").unwrap_or_default(),
            codec: str_at("video", "codec").unwrap_or_default(),
            keys_dir: PathBuf::from(str_at("keys", "directory").unwrap_or_default()),
            state_dir: PathBuf::from(str_at("state", "directory").unwrap_or_default()),
            queue_capacity: toml_value
                .get("recording")
                .and_then(|r| r.get("queue_capacity"))
                .and_then(|v| v.as_integer())
                .unwrap_or(0)
                .max(0) as usize,
            thresholds: StorageThresholds::DEFAULT,
        })
    }

    /// Create empty RecorderConfig (all empty/default values)
    /// 创建空的 RecorderConfig
    pub fn empty() -> Self {
        Self {
            output_dir: None,
            filename_pattern: String::new(),
            codec: String::new(),
            keys_dir: PathBuf::new(),
            state_dir: PathBuf::new(),
            queue_capacity: 0,
            thresholds: StorageThresholds::DEFAULT,
        }
    }

    /// Build paths under a base data directory computed by the caller.
    /// 从调用方提供的数据目录构建路径。
    pub fn with_system_defaults(data_dir: PathBuf) -> Self {
        Self {
            keys_dir: data_dir.join("keys"),
            state_dir: data_dir.join("state"),
            ..Self::empty()
        }
    }
}
