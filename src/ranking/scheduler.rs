use crate::ranking::cache::ContestViewCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Periodically refreshes a [`ContestViewCache`].
///
/// The next refresh is armed only once the current one has completed, so the interval is the
/// gap between refreshes rather than their period, and runs never overlap. Stops when dropped.
pub struct RefreshScheduler {
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn spawn(cache: Arc<ContestViewCache>, interval: Duration) -> Self {
        info!(?interval, "Starting ranking refresh scheduler");
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if let Err(e) = cache.refresh().await {
                    warn!("Ranking refresh failed, keeping the previous ranking: {e:#}");
                }
            }
        });
        Self { handle }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
