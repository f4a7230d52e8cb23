// ── Per-device stream session ──
//
// One long-lived subscription per device: connect → subscribe → read
// until the stream fails or ends → back off → reconnect. Only the
// cancellation token ends the loop.

mod backoff;
mod dialer;
mod subscription;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::StreamExt as _;
use gridtel_api::proto::{Notification, SubscribeRequest, SubscribeResponse, subscribe_response};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::{CollectorConfig, Device};
use crate::decode::decode_update;
use crate::error::CoreError;
use crate::model::{SessionState, StreamState};
use crate::store::TelemetryStore;

pub use backoff::{Backoff, BackoffPolicy};
pub use dialer::{Dialer, GnmiDialer, ResponseStream};
pub use subscription::{PROFILE_VERSION, SUBSCRIPTION_PATHS, subscribe_request};

/// Maintains the subscription for a single device.
pub struct StreamSession<D> {
    device: Device,
    dialer: Arc<D>,
    store: Arc<TelemetryStore>,
    request: SubscribeRequest,
    connect_timeout: Duration,
    backoff: Backoff,
    last_error: Option<String>,
}

impl<D: Dialer> StreamSession<D> {
    pub fn new(
        device: Device,
        dialer: Arc<D>,
        store: Arc<TelemetryStore>,
        config: &CollectorConfig,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            device,
            dialer,
            store,
            request: subscribe_request(config.sample_interval)?,
            connect_timeout: config.connect_timeout,
            backoff: Backoff::new(config.backoff),
            last_error: None,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Run until `cancel` fires. Cancellation interrupts an in-flight
    /// connect, read, or backoff sleep.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            self.publish(StreamState::Connecting);

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                result = self.connect_and_read(&cancel) => result,
            };
            let err = match result {
                Ok(()) => break,
                Err(e) => e,
            };

            self.store.mark_disconnected(&self.device.id);
            let delay = self.backoff.next_delay();
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            let next_attempt_at = TimeDelta::from_std(delay)
                .ok()
                .and_then(|d| self.store.now().checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            if err.is_transient() {
                warn!(
                    device = %self.device.id,
                    error = %err,
                    attempt = self.backoff.attempt(),
                    delay_ms,
                    "subscription lost, waiting before reconnect"
                );
            } else {
                error!(
                    device = %self.device.id,
                    error = %err,
                    auth = err.is_auth_rejected(),
                    attempt = self.backoff.attempt(),
                    delay_ms,
                    "subscription rejected, retrying after backoff"
                );
            }
            self.last_error = Some(CoreError::from(err).to_string());
            self.publish(StreamState::Backoff {
                next_attempt_at,
                delay_ms,
            });

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        debug!(device = %self.device.id, "stream session exiting");
    }

    // ── Single subscription lifecycle ────────────────────────────────

    /// Dial and read until the stream fails. `Ok` only on cancellation.
    async fn connect_and_read(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<(), gridtel_api::Error> {
        info!(
            device = %self.device.id,
            host = %self.device.host,
            port = self.device.port,
            "connecting"
        );

        let dial = self.dialer.dial(&self.device, self.request.clone());
        let mut stream = match tokio::time::timeout(self.connect_timeout, dial).await {
            Ok(result) => result?,
            Err(_) => return Err(gridtel_api::Error::timeout("subscribe", self.connect_timeout)),
        };

        info!(device = %self.device.id, "subscription established");
        self.publish(StreamState::Streaming);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(()),
                item = stream.next() => match item {
                    Some(Ok(response)) => self.handle(response),
                    Some(Err(e)) => return Err(e),
                    None => return Err(gridtel_api::Error::StreamEnded),
                },
            }
        }
    }

    fn handle(&mut self, response: SubscribeResponse) {
        if self.backoff.attempt() > 0 || self.last_error.is_some() {
            self.backoff.reset();
            self.last_error = None;
            self.publish(StreamState::Streaming);
        }
        self.store.touch(&self.device.id);

        match response.response {
            Some(subscribe_response::Response::Update(notification)) => {
                self.apply_notification(&notification);
            }
            Some(subscribe_response::Response::SyncResponse(_)) => {
                debug!(device = %self.device.id, "initial sync complete");
            }
            None => trace!(device = %self.device.id, "empty subscribe response"),
        }
    }

    fn apply_notification(&self, notification: &Notification) {
        let id = &self.device.id;
        for update in &notification.update {
            match decode_update(notification.prefix.as_ref(), update) {
                Ok(decoded) => {
                    self.store.apply(id, &decoded.path, &decoded.value);
                }
                Err(e) => warn!(device = %id, error = %e, "skipping undecodable update"),
            }
        }
        if !notification.delete.is_empty() {
            debug!(device = %id, count = notification.delete.len(), "ignoring deletes");
        }
    }

    fn publish(&self, state: StreamState) {
        self.store.set_session(
            &self.device.id,
            SessionState {
                state,
                retries: self.backoff.attempt(),
                last_error: self.last_error.clone(),
                profile_version: PROFILE_VERSION,
            },
        );
    }
}
