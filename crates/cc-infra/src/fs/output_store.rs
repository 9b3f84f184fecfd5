//! Filesystem output store.
//!
//! Files are created as `busy_<name>` with `create_new`, then moved to
//! `<name>` on a clean finish or to `corrupted_<name>` otherwise. Moves go
//! through `hard_link` + `remove_file`, so an existing target is never
//! replaced, even one that appears concurrently. Nothing is ever deleted or
//! overwritten here.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use cc_core::ports::{
    IncompleteKind, IncompleteRecording, OutputFile, OutputStorePort, RawSink, StorageError,
};
use tracing::{debug, info, warn};

/// Upper bound on `-N` suffixes tried when a target name is taken.
const MAX_COLLISION_SUFFIX: u32 = 10_000;

#[derive(Debug, Default, Clone, Copy)]
pub struct FsOutputStore;

impl FsOutputStore {
    pub fn new() -> Self {
        Self
    }

    /// `name`, `stem-1.ext`, `stem-2.ext`, ...
    fn candidates(dir: &Path, name: &str) -> impl Iterator<Item = PathBuf> {
        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), Some(ext.to_string())),
            _ => (name.to_string(), None),
        };
        let dir = dir.to_path_buf();
        let first = dir.join(name);
        std::iter::once(first).chain((1..=MAX_COLLISION_SUFFIX).map(move |n| {
            let alt = match &ext {
                Some(ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            };
            dir.join(alt)
        }))
    }

    /// Move `from` to the first free candidate for `name` without replacing
    /// anything that already exists there.
    fn move_no_replace(from: &Path, dir: &Path, name: &str) -> Result<PathBuf, StorageError> {
        for candidate in Self::candidates(dir, name) {
            match fs::hard_link(from, &candidate) {
                Ok(()) => {
                    if let Err(source) = fs::remove_file(from) {
                        // Keep the source name; the link is a duplicate.
                        let _ = fs::remove_file(&candidate);
                        return Err(StorageError::Io {
                            path: from.to_path_buf(),
                            source,
                        });
                    }
                    return Ok(candidate);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    // No hard links on this filesystem.
                    debug!(error = %e, "hard link unavailable, falling back to rename");
                    if candidate.exists() {
                        continue;
                    }
                    fs::rename(from, &candidate).map_err(|source| StorageError::Io {
                        path: from.to_path_buf(),
                        source,
                    })?;
                    return Ok(candidate);
                }
            }
        }

        Err(StorageError::Io {
            path: dir.join(name),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "no free file name"),
        })
    }
}

impl OutputStorePort for FsOutputStore {
    fn create_busy(
        &self,
        dir: &Path,
        final_name: &str,
    ) -> Result<(OutputFile, Box<dyn RawSink>), StorageError> {
        let meta = fs::metadata(dir).map_err(|source| StorageError::DirectoryUnavailable {
            path: dir.to_path_buf(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(StorageError::DirectoryUnavailable {
                path: dir.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "not a directory"),
            });
        }

        let output = OutputFile::new(dir, final_name);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&output.busy_path)
            .map_err(|source| match source.kind() {
                io::ErrorKind::AlreadyExists => StorageError::Io {
                    path: output.busy_path.clone(),
                    source,
                },
                _ => StorageError::DirectoryUnavailable {
                    path: dir.to_path_buf(),
                    source,
                },
            })?;

        debug!(path = %output.busy_path.display(), "busy file created");
        Ok((output, Box::new(file)))
    }

    fn publish(&self, file: &OutputFile) -> Result<PathBuf, StorageError> {
        let target = Self::move_no_replace(&file.busy_path, &file.dir, &file.final_name)?;
        if target.file_name() != Some(std::ffi::OsStr::new(&file.final_name)) {
            warn!(
                wanted = %file.final_name,
                used = %target.display(),
                "final name taken, published under a suffixed name"
            );
        }
        info!(path = %target.display(), "recording published");
        Ok(target)
    }

    fn mark_corrupted(&self, file: &OutputFile) -> Result<PathBuf, StorageError> {
        let corrupted = file.corrupted_path();
        let name = corrupted
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target = Self::move_no_replace(&file.busy_path, &file.dir, &name)?;
        warn!(path = %target.display(), "recording marked corrupted");
        Ok(target)
    }

    fn list_incomplete(&self, dir: &Path) -> Result<Vec<IncompleteRecording>, StorageError> {
        let entries = fs::read_dir(dir).map_err(|source| StorageError::DirectoryUnavailable {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StorageError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some((kind, intended)) = IncompleteKind::classify(name) else {
                continue;
            };
            let meta = match entry.metadata() {
                Ok(meta) if meta.is_file() => meta,
                Ok(_) => continue,
                Err(e) => {
                    warn!(file = name, error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            out.push(IncompleteRecording {
                path: entry.path(),
                kind,
                intended_name: intended.to_string(),
                size_bytes: meta.len(),
            });
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }
}
