use std::path::Path;
use std::sync::Arc;

use cc_core::ports::{IncompleteRecording, OutputStorePort, StorageError};
use tracing::info;

/// Use case for listing recordings that were never cleanly finalized.
/// 列出未正常完成的录制文件（busy_ / corrupted_）。
pub struct ScanIncompleteRecordings {
    store: Arc<dyn OutputStorePort>,
}

impl ScanIncompleteRecordings {
    pub fn from_ports(store: Arc<dyn OutputStorePort>) -> Self {
        Self { store }
    }

    /// Busy and corrupted files in `dir`, sorted by path.
    #[tracing::instrument(
        name = "usecase.scan_incomplete.execute",
        skip(self),
        fields(dir = %dir.display())
    )]
    pub fn execute(&self, dir: &Path) -> Result<Vec<IncompleteRecording>, StorageError> {
        let found = self.store.list_incomplete(dir)?;
        info!(count = found.len(), "incomplete recordings scanned");
        Ok(found)
    }
}
