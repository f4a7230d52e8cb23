// ── Staleness supervisor ──
//
// Periodic sweep that flags Connected devices gone quiet as Stale. It
// never reconnects anything; a stale device recovers on its next message.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::CollectorConfig;
use crate::store::TelemetryStore;

#[derive(Debug, Clone)]
pub struct StalenessSupervisor {
    store: Arc<TelemetryStore>,
    period: Duration,
    threshold: Duration,
}

impl StalenessSupervisor {
    pub fn new(store: Arc<TelemetryStore>, config: &CollectorConfig) -> Self {
        Self {
            store,
            period: config.stale_check_interval,
            threshold: config.stale_threshold,
        }
    }

    /// One sweep against the store clock. Returns the devices flagged.
    pub fn sweep(&self) -> Vec<String> {
        let stale = self.store.mark_stale(self.threshold, self.store.now());
        for device in &stale {
            info!(device = %device, threshold_s = self.threshold.as_secs(), "device went stale");
        }
        stale
    }

    /// Sweep every `period` until cancelled.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.period);
        interval.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.sweep();
                }
            }
        }

        debug!("staleness supervisor exiting");
    }
}
