//! Periodic liveness pings for stream subscribers.
//!
//! Intermediaries (proxies, load balancers) reclaim idle long-lived
//! responses; a ping every period keeps them open. A ping queued for a
//! subscriber whose stream is gone fails, and the registry drops it.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::registry::SubscriberRegistry;

/// Default interval between heartbeat pings.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

// ---------------------------------------------------------------------------
// HeartbeatScheduler
// ---------------------------------------------------------------------------

/// Background task that pings every subscriber on a fixed period.
pub struct HeartbeatScheduler {
    registry: Arc<SubscriberRegistry>,
    period: Duration,
}

impl HeartbeatScheduler {
    /// `period` must be non-zero.
    pub fn new(registry: Arc<SubscriberRegistry>, period: Duration) -> Self {
        Self { registry, period }
    }

    /// Run the heartbeat loop until `cancel` fires.
    ///
    /// The first ping goes out one full period after start; new subscribers
    /// already receive an immediate ping from the registry.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(period_secs = self.period.as_secs_f64(), "Heartbeat started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Heartbeat stopped");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.registry.ping_all();
                    tracing::debug!(
                        delivered = report.delivered,
                        failed = report.failed,
                        "Heartbeat ping"
                    );
                }
            }
        }
    }

    /// Spawn [`run`](Self::run) onto the current Tokio runtime.
    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
