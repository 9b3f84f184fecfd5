use async_trait::async_trait;

/// Per-installation file counter.
///
/// Strictly increasing across restarts. A number is never handed out twice,
/// even if the files that used it are gone.
///
/// 持久化的单调递增计数器，不从目录内容推导。
#[async_trait]
pub trait FileCounterPort: Send + Sync {
    /// Persist and return the next number. The first call returns 1.
    async fn next(&self) -> anyhow::Result<u64>;
}
