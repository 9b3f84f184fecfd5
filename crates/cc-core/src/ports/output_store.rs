//! Output file lifecycle.
//!
//! ```text
//! create_busy   -> <dir>/busy_<name>
//! publish       -> <dir>/<name>            (clean close only)
//! mark_corrupted-> <dir>/corrupted_<name>
//! ```
//!
//! The rename out of the busy name is the commit point of a recording.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::RawSink;

pub const BUSY_PREFIX: &str = "busy_";
pub const CORRUPTED_PREFIX: &str = "corrupted_";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("output directory {path} is unavailable: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("free space query failed for {path}: {message}")]
    SpaceQuery { path: PathBuf, message: String },
}

/// A file created under its busy name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub dir: PathBuf,
    pub final_name: String,
    pub busy_path: PathBuf,
}

impl OutputFile {
    pub fn new(dir: &Path, final_name: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            final_name: final_name.to_string(),
            busy_path: dir.join(format!("{BUSY_PREFIX}{final_name}")),
        }
    }

    pub fn corrupted_path(&self) -> PathBuf {
        self.dir.join(format!("{CORRUPTED_PREFIX}{}", self.final_name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncompleteKind {
    /// Never finalized: still being written, or the writer died.
    Busy,
    /// Finalized, but flagged as not a valid recording.
    Corrupted,
}

impl IncompleteKind {
    /// Classify a file name, returning the kind and the name it would have
    /// carried as a complete recording.
    pub fn classify(file_name: &str) -> Option<(IncompleteKind, &str)> {
        if let Some(rest) = file_name.strip_prefix(BUSY_PREFIX) {
            Some((IncompleteKind::Busy, rest))
        } else {
            file_name
                .strip_prefix(CORRUPTED_PREFIX)
                .map(|rest| (IncompleteKind::Corrupted, rest))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteRecording {
    pub path: PathBuf,
    pub kind: IncompleteKind,
    pub intended_name: String,
    pub size_bytes: u64,
}

/// Storage for output files.
pub trait OutputStorePort: Send + Sync {
    /// Create `busy_<final_name>` exclusively and return a raw sink over it.
    fn create_busy(
        &self,
        dir: &Path,
        final_name: &str,
    ) -> Result<(OutputFile, Box<dyn RawSink>), StorageError>;

    /// Rename to the final name. Never overwrites; returns the path used.
    fn publish(&self, file: &OutputFile) -> Result<PathBuf, StorageError>;

    /// Rename to the corrupted marker name. Never deletes.
    fn mark_corrupted(&self, file: &OutputFile) -> Result<PathBuf, StorageError>;

    /// Busy or corrupted files in `dir`.
    fn list_incomplete(&self, dir: &Path) -> Result<Vec<IncompleteRecording>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_file_paths() {
        let f = OutputFile::new(Path::new("/out"), "cryptocam-0001.age");
        assert_eq!(f.busy_path, PathBuf::from("/out/busy_cryptocam-0001.age"));
        assert_eq!(
            f.corrupted_path(),
            PathBuf::from("/out/corrupted_cryptocam-0001.age")
        );
    }

    #[test]
    fn classify_prefixes() {
        assert_eq!(
            IncompleteKind::classify("busy_a.age"),
            Some((IncompleteKind::Busy, "a.age"))
        );
        assert_eq!(
            IncompleteKind::classify("corrupted_a.age"),
            Some((IncompleteKind::Corrupted, "a.age"))
        );
        assert_eq!(IncompleteKind::classify("a.age"), None);
    }
}
