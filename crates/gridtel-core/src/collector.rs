// ── Collector ──
//
// Owns the store and every background task: one stream session per
// configured device plus the staleness supervisor. Each task runs under
// a child of the collector's root cancellation token.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{CollectorConfig, Roster};
use crate::error::CoreError;
use crate::session::{Dialer, GnmiDialer, StreamSession};
use crate::snapshot::SnapshotApi;
use crate::store::TelemetryStore;
use crate::supervisor::StalenessSupervisor;

/// Telemetry collector for a fixed device roster.
pub struct Collector<D: Dialer = GnmiDialer> {
    config: CollectorConfig,
    roster: Arc<Roster>,
    store: Arc<TelemetryStore>,
    dialer: Arc<D>,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Collector<GnmiDialer> {
    /// Production collector: gNMI transport and the system clock.
    pub fn gnmi(config: CollectorConfig, roster: Roster) -> Self {
        let dialer = GnmiDialer::new(config.clone());
        Self::new(config, roster, dialer, Arc::new(SystemClock))
    }
}

impl<D: Dialer> Collector<D> {
    pub fn new(config: CollectorConfig, roster: Roster, dialer: D, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            roster: Arc::new(roster),
            store: Arc::new(TelemetryStore::new(clock)),
            dialer: Arc::new(dialer),
            cancel: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    pub fn store(&self) -> &Arc<TelemetryStore> {
        &self.store
    }

    pub fn roster(&self) -> &Arc<Roster> {
        &self.roster
    }

    /// A query handle sharing this collector's store.
    pub fn snapshot_api(&self) -> SnapshotApi {
        SnapshotApi::new(Arc::clone(&self.roster), Arc::clone(&self.store))
    }

    /// Spawn a session per device and the staleness supervisor.
    ///
    /// Calling this twice is a no-op.
    pub fn start(&mut self) -> Result<(), CoreError> {
        if !self.handles.is_empty() {
            warn!("collector already started");
            return Ok(());
        }

        let mut sessions = Vec::with_capacity(self.roster.device_count());
        for device in self.roster.devices() {
            sessions.push(StreamSession::new(
                device.clone(),
                Arc::clone(&self.dialer),
                Arc::clone(&self.store),
                &self.config,
            )?);
        }

        for session in sessions {
            debug!(device = %session.device().id, "spawning stream session");
            self.handles
                .push(tokio::spawn(session.run(self.cancel.child_token())));
        }

        let supervisor = StalenessSupervisor::new(Arc::clone(&self.store), &self.config);
        self.handles
            .push(tokio::spawn(supervisor.run(self.cancel.child_token())));

        info!(devices = self.roster.device_count(), "collector started");
        Ok(())
    }

    /// Cancel every task and wait for all of them to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "collector task ended abnormally");
            }
        }
        info!("collector stopped");
    }
}
