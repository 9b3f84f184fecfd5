//! Low-storage guard.
//!
//! Refuses to start below `min_to_start` free bytes and aborts a running
//! session once free space drops below `critical_during_recording`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cc_core::config::StorageThresholds;
use cc_core::ports::StorageSpacePort;
use cc_core::recording::AbortReason;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::session::SessionShared;
use super::StartError;

#[derive(Clone)]
pub struct StorageGuard {
    space: Arc<dyn StorageSpacePort>,
    thresholds: StorageThresholds,
}

impl StorageGuard {
    pub fn new(space: Arc<dyn StorageSpacePort>, thresholds: StorageThresholds) -> Self {
        Self { space, thresholds }
    }

    /// Pre-start check. A failed query does not block the start; directory
    /// problems surface when the file is created.
    pub fn check_can_start(&self, dir: &Path) -> Result<(), StartError> {
        match self.space.available_bytes(dir) {
            Ok(available) if available < self.thresholds.min_to_start => {
                info!(
                    available_bytes = available,
                    required_bytes = self.thresholds.min_to_start,
                    "not enough free space to start"
                );
                Err(StartError::InsufficientStorage {
                    available,
                    required: self.thresholds.min_to_start,
                })
            }
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(error = %e, "free space unknown, starting anyway");
                Ok(())
            }
        }
    }

    /// Poll free space for an active session until it finishes or `shutdown`
    /// flips.
    pub(crate) fn spawn_monitor(
        &self,
        dir: PathBuf,
        shared: Arc<SessionShared>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let space = self.space.clone();
        let critical = self.thresholds.critical_during_recording;
        let period = Duration::from_millis(self.thresholds.poll_interval_ms.max(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if shared.is_winding_down() {
                            break;
                        }
                        let space = space.clone();
                        let dir = dir.clone();
                        let query = tokio::task::spawn_blocking(move || space.available_bytes(&dir)).await;
                        match query {
                            Ok(Ok(available)) if available < critical => {
                                warn!(
                                    available_bytes = available,
                                    critical_bytes = critical,
                                    "free space critical, aborting recording"
                                );
                                shared.abort(AbortReason::LowStorage { available_bytes: available });
                                break;
                            }
                            Ok(Ok(available)) => {
                                debug!(available_bytes = available, "free space ok");
                            }
                            Ok(Err(e)) => warn!(error = %e, "free space query failed"),
                            Err(e) => warn!(error = %e, "free space query task failed"),
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
            debug!("storage monitor stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_core::ports::StorageError;
    use mockall::mock;

    mock! {
        pub Space {}

        impl StorageSpacePort for Space {
            fn available_bytes(&self, path: &Path) -> Result<u64, StorageError>;
        }
    }

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn refuses_to_start_below_minimum() {
        let mut space = MockSpace::new();
        space.expect_available_bytes().returning(|_| Ok(99 * MIB));
        let guard = StorageGuard::new(Arc::new(space), StorageThresholds::DEFAULT);

        let err = guard.check_can_start(Path::new("/out")).unwrap_err();
        assert!(matches!(
            err,
            StartError::InsufficientStorage { available, required }
                if available == 99 * MIB && required == 100 * MIB
        ));
    }

    #[test]
    fn starts_at_minimum() {
        let mut space = MockSpace::new();
        space.expect_available_bytes().returning(|_| Ok(100 * MIB));
        let guard = StorageGuard::new(Arc::new(space), StorageThresholds::DEFAULT);
        assert!(guard.check_can_start(Path::new("/out")).is_ok());
    }

    #[test]
    fn unknown_space_does_not_block() {
        let mut space = MockSpace::new();
        space.expect_available_bytes().returning(|p| {
            Err(StorageError::SpaceQuery {
                path: p.to_path_buf(),
                message: "no disk".into(),
            })
        });
        let guard = StorageGuard::new(Arc::new(space), StorageThresholds::DEFAULT);
        assert!(guard.check_can_start(Path::new("/out")).is_ok());
    }
}
