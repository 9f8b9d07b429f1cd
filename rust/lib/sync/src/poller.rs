use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::tracker::{Coalescing, Notification, Snapshot, SyncTracker, WatchKey};

/// Polling cadence and notification grouping for one watched view.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Delay between fetches (default: 2s).
    pub interval: Duration,
    pub coalescing: Coalescing,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            coalescing: Coalescing::PerCollection,
        }
    }
}

/// Produces the current collection sizes for a view.
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    async fn snapshot(&self) -> Result<Snapshot, SyncError>;
}

fn lock(tracker: &Mutex<SyncTracker>) -> MutexGuard<'_, SyncTracker> {
    tracker.lock().unwrap_or_else(|e| e.into_inner())
}

/// Keeps a poller alive. Dropping it stops the timer.
pub struct SyncHandle {
    tracker: Arc<Mutex<SyncTracker>>,
    cancel: CancellationToken,
}

impl SyncHandle {
    /// Count an item this client just added so the next tick is silent for it.
    pub fn record_local_add(&self, key: &WatchKey) {
        lock(&self.tracker).record_local_add(key);
    }

    pub fn last_seen(&self, key: &WatchKey) -> Option<usize> {
        lock(&self.tracker).last_seen(key)
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start polling `source`.
///
/// The first fetch primes the baseline and must succeed. After that, every
/// `config.interval` the source is fetched again and any growth is sent to
/// `sink`. Failed fetches are logged and skipped. The loop ends when the
/// handle is stopped or dropped, or when `sink` is closed.
pub async fn start(
    source: Arc<dyn SnapshotSource>,
    config: SyncConfig,
    sink: mpsc::Sender<Notification>,
) -> Result<SyncHandle, SyncError> {
    let baseline = source.snapshot().await?;
    let mut tracker = SyncTracker::new(config.coalescing);
    tracker.prime(&baseline);

    let tracker = Arc::new(Mutex::new(tracker));
    let cancel = CancellationToken::new();

    {
        let tracker = Arc::clone(&tracker);
        let cancel = cancel.clone();
        let interval = config.interval;

        tokio::spawn(async move {
            info!("sync poller started (interval={interval:?}, watching {} collections)", baseline.len());
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("sync poller stopped");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        let snapshot = match source.snapshot().await {
                            Ok(s) => s,
                            Err(e) => {
                                warn!("sync poll failed: {e}");
                                continue;
                            }
                        };
                        let notes = lock(&tracker).observe(&snapshot);
                        debug!("sync poll: {} notifications", notes.len());
                        for note in notes {
                            if sink.send(note).await.is_err() {
                                info!("sync sink closed, poller stopped");
                                return;
                            }
                        }
                    }
                }
            }
        });
    }

    Ok(SyncHandle { tracker, cancel })
}
