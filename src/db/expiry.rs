//! Time-to-live expiry: the storage-level reaper.
//!
//! Employee copies and archives carry an `expires_at` instant. Rows past it are
//! deleted by [`Database::purge_expired`], which the server runs on a fixed
//! interval. Deletion is eventual, not exact-at-expiry.

use super::Database;
use crate::types::PurgeStats;
use anyhow::Result;
use mockable::Clock;
use rusqlite::params;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

impl Database {
    /// Delete every task and archive whose `expires_at` is at or before `now`.
    pub fn purge_expired(&self, now: i64) -> Result<PurgeStats> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let tasks = tx.execute(
                "DELETE FROM tasks WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![now],
            )?;
            // archived_tasks rows go with their archive (ON DELETE CASCADE)
            let archives = tx.execute("DELETE FROM archives WHERE expires_at <= ?1", params![now])?;
            tx.commit()?;
            Ok(PurgeStats { tasks, archives })
        })
    }
}

/// Handle for stopping the background reaper.
pub struct ReaperHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ReaperHandle {
    /// Signal the reaper to stop after its current sweep.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Spawn the background reaper on the current tokio runtime.
pub fn spawn_reaper(
    db: Arc<Database>,
    clock: Arc<dyn Clock + Send + Sync>,
    interval: Duration,
) -> ReaperHandle {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("Expiry reaper shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let now = clock.utc().timestamp_millis();
                    match db.purge_expired(now) {
                        Ok(stats) if stats.tasks > 0 || stats.archives > 0 => {
                            info!(tasks = stats.tasks, archives = stats.archives, "Purged expired rows");
                        }
                        Ok(_) => debug!("Expiry sweep found nothing to purge"),
                        Err(e) => warn!(error = %e, "Expiry sweep failed"),
                    }
                }
            }
        }
    });

    ReaperHandle {
        shutdown_tx: Some(shutdown_tx),
    }
}
