//! # Configuration Loader / 配置加载器
//!
//! Reads the recorder TOML file and maps it onto [`RecorderConfig`].
//! No validation and no defaults here; empty values are facts for the
//! layers above.
//!
//! 仅纯数据加载，不做校验。

use anyhow::Context;
use std::path::Path;

use cc_core::config::RecorderConfig;

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: impl AsRef<Path>) -> anyhow::Result<RecorderConfig> {
    let config_path = config_path.as_ref();
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    RecorderConfig::from_toml(&toml_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_reads_valid_toml() {
        let toml_content = r#"
            [output]
            directory = "/storage/DCIM/cryptocam"
            filename_pattern = "$year$month$day-$$num"

            [video]
            codec = "HEVC"

            [keys]
            directory = "/data/keys"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config(temp_file.path()).unwrap();

        assert_eq!(
            config.output_dir,
            Some(PathBuf::from("/storage/DCIM/cryptocam"))
        );
        assert_eq!(config.filename_pattern, "$year$month$day-$$num");
        assert_eq!(config.codec, "HEVC");
        assert_eq!(config.keys_dir, PathBuf::from("/data/keys"));
        assert_eq!(config.state_dir, PathBuf::new());
    }

    /// Missing values stay empty
    /// 缺失的值保持为空
    #[test]
    fn test_load_config_returns_empty_values_when_missing() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[output]\n").unwrap();

        let config = load_config(temp_file.path()).unwrap();

        assert_eq!(config, RecorderConfig::empty());
    }

    #[test]
    fn test_load_config_rejects_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[output\ndirectory = ").unwrap();

        let err = load_config(temp_file.path()).unwrap_err();

        assert!(err.to_string().contains("Failed to parse config as TOML"));
    }

    #[test]
    fn test_load_config_returns_io_error_on_file_not_found() {
        let err = load_config("/this/path/does/not/exist/cryptocam.toml").unwrap_err();

        assert!(
            err.to_string().contains("Failed to read config file"),
            "Expected IO error message, got: {err}"
        );
    }
}
