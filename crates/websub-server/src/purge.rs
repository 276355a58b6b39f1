//! Periodic removal of expired subscriptions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use websub_core::subscription::current_millis;
use websub_core::SharedStore;

/// Handle for a background purge task.
pub struct PurgeTask {
    handle: JoinHandle<()>,
    stop: Arc<Notify>,
}

impl PurgeTask {
    /// Start a background task purging expired subscriptions every `interval`.
    pub fn start(store: SharedStore, interval: Duration) -> Self {
        let stop = Arc::new(Notify::new());
        let stop_signal = stop.clone();

        let handle = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "background purge task started");

            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // Skip first immediate tick

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = stop_signal.notified() => {
                        info!("background purge task stopping");
                        break;
                    }
                }

                match store.purge_expired(current_millis()) {
                    Ok(0) => {}
                    Ok(removed) => info!(removed, "expired subscriptions purged"),
                    Err(e) => warn!(error = %e, "failed to purge expired subscriptions"),
                }
            }
        });

        Self { handle, stop }
    }

    /// Signal the purge task to stop.
    pub fn stop(&self) {
        self.stop.notify_one();
    }

    /// Stop the purge task and wait for it to finish.
    pub async fn join(self) {
        self.stop();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "purge task panicked");
        }
    }
}
