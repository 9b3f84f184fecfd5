use std::path::Path;

use super::StorageError;

/// Free-space query for the volume holding a path.
pub trait StorageSpacePort: Send + Sync {
    fn available_bytes(&self, path: &Path) -> Result<u64, StorageError>;
}
