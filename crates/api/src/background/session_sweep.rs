//! Periodic eviction of expired import sessions.
//!
//! Creating a session already prunes the registry, so this sweep only
//! matters while no new imports arrive.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::sessions::SessionRegistry;

/// Prune `sessions` every `interval` until `cancel` is triggered.
pub async fn run(sessions: Arc<SessionRegistry>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Session sweep started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                let evicted = sessions.prune(chrono::Utc::now()).await;
                if evicted > 0 {
                    tracing::info!(evicted, "Session sweep: evicted expired sessions");
                } else {
                    tracing::debug!("Session sweep: nothing to evict");
                }
            }
        }
    }
}
