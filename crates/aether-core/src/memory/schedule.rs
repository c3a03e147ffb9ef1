//! Periodic retention sweeps.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::retention::RetentionRitual;

/// Run `cleanse_entropy` every `period` until `shutdown` becomes `true` or its
/// sender is dropped. The first sweep runs immediately; ticks missed while a
/// sweep is running are skipped. The task yields the number of completed
/// sweeps.
pub fn spawn_retention_schedule(
    ritual: Arc<RetentionRitual>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut completed = 0usize;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match ritual.cleanse_entropy().await {
                        Ok(report) => {
                            completed += 1;
                            info!(
                                status = %report.status,
                                deleted_count = report.deleted_count,
                                "scheduled sweep finished"
                            );
                        }
                        Err(e) => error!(error = %e, "scheduled sweep failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(completed, "retention schedule stopped");
        completed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::memory::RetentionPolicy;
    use aether_state::MemoryGemStore;

    #[tokio::test(start_paused = true)]
    async fn sweeps_on_each_tick_until_shutdown() {
        let audit = MemoryAuditSink::new();
        let ritual = Arc::new(RetentionRitual::new(
            Arc::new(MemoryGemStore::new()),
            RetentionPolicy::default(),
            audit.clone(),
        ));
        let (tx, rx) = watch::channel(false);
        let handle = spawn_retention_schedule(ritual, Duration::from_secs(60), rx);

        // Ticks at 0s, 60s and 120s.
        tokio::time::sleep(Duration::from_secs(150)).await;
        tx.send(true).unwrap();

        assert_eq!(handle.await.unwrap(), 3);
        assert_eq!(audit.by_action("Cleanse").len(), 3);
    }

    #[tokio::test]
    async fn dropping_sender_stops_schedule() {
        let ritual = Arc::new(RetentionRitual::new(
            Arc::new(MemoryGemStore::new()),
            RetentionPolicy::default(),
            MemoryAuditSink::new(),
        ));
        let (tx, rx) = watch::channel(false);
        let handle = spawn_retention_schedule(ritual, Duration::from_secs(3600), rx);
        drop(tx);
        assert!(handle.await.unwrap() <= 1);
    }
}
