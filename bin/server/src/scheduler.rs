//! Periodic job scheduling.

use crate::jobs::{CatalogSync, Notifier};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Spawns the periodic sync-then-notify loop.
///
/// The first run starts immediately; one failed run is logged and the
/// loop waits for the next tick. Notification dispatch only runs after
/// a sync committed.
pub fn spawn(sync: CatalogSync, notifier: Notifier, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;

            let stamped_at = match sync.run().await {
                Ok(stamped_at) => stamped_at,
                Err(error) => {
                    tracing::error!(%error, "sync run failed");
                    continue;
                }
            };

            if let Err(error) = notifier.run(stamped_at).await {
                tracing::error!(%error, "notification dispatch failed");
            }
        }
    })
}
