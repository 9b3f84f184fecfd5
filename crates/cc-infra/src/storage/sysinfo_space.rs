use std::path::{Path, PathBuf};

use cc_core::ports::{StorageError, StorageSpacePort};
use sysinfo::Disks;
use tracing::trace;

/// Free-space lookup over `sysinfo` disk listings.
///
/// The disk whose mount point is the longest prefix of the queried path wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoStorageSpace;

impl SysinfoStorageSpace {
    pub fn new() -> Self {
        Self
    }

    fn best_match<'a, I>(path: &Path, mounts: I) -> Option<u64>
    where
        I: IntoIterator<Item = (&'a Path, u64)>,
    {
        mounts
            .into_iter()
            .filter(|(mount, _)| path.starts_with(mount))
            .max_by_key(|(mount, _)| mount.components().count())
            .map(|(_, available)| available)
    }
}

impl StorageSpacePort for SysinfoStorageSpace {
    fn available_bytes(&self, path: &Path) -> Result<u64, StorageError> {
        let resolved: PathBuf = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let disks = Disks::new_with_refreshed_list();
        let available = Self::best_match(
            &resolved,
            disks
                .list()
                .iter()
                .map(|d| (d.mount_point(), d.available_space())),
        )
        .ok_or_else(|| StorageError::SpaceQuery {
            path: resolved.clone(),
            message: "no mounted disk contains this path".to_string(),
        })?;

        trace!(path = %resolved.display(), available_bytes = available, "free space queried");
        Ok(available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_mount_prefix_wins() {
        let mounts = [
            (Path::new("/"), 10u64),
            (Path::new("/storage"), 20),
            (Path::new("/storage/emulated"), 30),
        ];
        let got = SysinfoStorageSpace::best_match(
            Path::new("/storage/emulated/0/DCIM"),
            mounts.iter().copied(),
        );
        assert_eq!(got, Some(30));
    }

    #[test]
    fn path_component_prefix_not_string_prefix() {
        let mounts = [(Path::new("/"), 1u64), (Path::new("/stor"), 2)];
        let got = SysinfoStorageSpace::best_match(Path::new("/storage/x"), mounts.iter().copied());
        assert_eq!(got, Some(1));
    }

    #[test]
    fn no_match_is_none() {
        let mounts: [(&Path, u64); 0] = [];
        assert_eq!(
            SysinfoStorageSpace::best_match(Path::new("/x"), mounts.iter().copied()),
            None
        );
    }
}
