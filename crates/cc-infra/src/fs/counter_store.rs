use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use cc_core::ports::FileCounterPort;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::atomic_write;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CounterFile {
    last_issued: u64,
}

/// File counter persisted as `counter.json` in the state directory.
///
/// The new value is on disk before it is returned, so a crash can skip a
/// number but never reuse one.
pub struct FileCounterStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCounterStore {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            path: state_dir.join("counter.json"),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<CounterFile> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("parse counter failed: {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CounterFile::default()),
            Err(e) => Err(e)
                .with_context(|| format!("read counter failed: {}", self.path.display())),
        }
    }
}

#[async_trait]
impl FileCounterPort for FileCounterStore {
    async fn next(&self) -> Result<u64> {
        let _guard = self.lock.lock().await;

        let current = self.load().await?;
        let next = current
            .last_issued
            .checked_add(1)
            .context("file counter exhausted")?;

        let json = serde_json::to_vec_pretty(&CounterFile { last_issued: next })?;
        atomic_write(&self.path, &json).await?;

        debug!(counter = next, "file counter advanced");
        Ok(next)
    }
}
