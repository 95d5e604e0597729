use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::broker::TaskBroker;

/// Periodic lease-expiry watchdog.
///
/// Every tick it takes the broker's write lock, reclaims whatever leases
/// have expired, and goes back to sleep. Workers that died silently lose
/// their tasks back to the ready queue here; workers that merely run slow
/// may see their task handed to someone else, and the broker tolerates the
/// resulting late acknowledgment.
pub struct Sweeper {
    interval: Duration,
}

impl Sweeper {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Run the sweep loop until `shutdown` is cancelled.
    pub async fn run(&self, broker: Arc<RwLock<TaskBroker>>, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        tracing::debug!(interval = ?self.interval, "Sweeper started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    broker.write().await.recover_expired(Instant::now());
                }
                _ = shutdown.cancelled() => {
                    tracing::debug!("Sweeper stopped");
                    break;
                }
            }
        }
    }
}
