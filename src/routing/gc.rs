//! Background garbage collection of idle Forward rules.
//!
//! The sweep is a reaper, not a correctness mechanism: lookups re-check
//! staleness themselves, so a rule is never served between its keep-alive
//! running out and the next sweep.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use super::RoutingTable;

/// Handle to a running GC task.
///
/// Dropping the handle also stops the task, without waiting for it.
#[derive(Debug)]
pub struct GcHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl GcHandle {
    /// Signal the task to stop and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            debug!(error = %e, "Routing GC task ended abnormally");
        }
    }

    /// Check whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the GC task on the current tokio runtime.
///
/// Every `interval` the task removes Forward rules whose keep-alive has
/// elapsed. App rules are left alone.
pub fn spawn_gc<T>(table: Arc<T>, interval: Duration) -> GcHandle
where
    T: RoutingTable + ?Sized + 'static,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let period = interval.max(Duration::from_millis(1));

    let task = tokio::spawn(async move {
        let mut tick = tokio::time::interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the table is fresh then.
        tick.tick().await;

        debug!(interval_ms = period.as_millis() as u64, "Routing GC started");

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let removed = table.collect_garbage();
                    if removed > 0 {
                        debug!(removed, remaining = table.count(), "Removed stale forward rules");
                    } else {
                        trace!("Routing GC sweep found nothing to remove");
                    }
                }
                // Err means the handle was dropped.
                res = stop_rx.changed() => {
                    if res.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("Routing GC stopped");
    });

    GcHandle { stop_tx, task }
}
