use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;

/// Write `content` to `path` through a sibling temp file and a rename, so
/// readers see either the old or the new content.
pub async fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create dir failed: {}", parent.display()))?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    fs::write(&tmp_path, content)
        .await
        .with_context(|| format!("write temp file failed: {}", tmp_path.display()))?;

    fs::rename(&tmp_path, path).await.with_context(|| {
        format!(
            "rename temp file to target failed: {} -> {}",
            tmp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn writes_and_replaces_without_leaving_tmp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/state.json");

        atomic_write(&path, b"one").await.unwrap();
        atomic_write(&path, b"two").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"two");
        assert!(!dir.path().join("nested/state.json.tmp").exists());
    }
}
