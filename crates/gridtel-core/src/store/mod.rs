// ── Telemetry store ──
//
// Per-device caches in a sharded concurrent map. Each update is applied
// as one copy-on-write swap of the device's `Arc<DeviceCache>`, so
// readers holding a snapshot never observe a half-applied update.

mod apply;
pub mod classify;
mod fields;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::clock::Clock;
use crate::decode::{DecodedPath, TelemetryValue};
use crate::model::{DeviceCache, DeviceStatus, SessionState};

pub use classify::{BgpKind, Domain, InterfaceSource, classify};

/// Shared owner of every device cache and published session state.
#[derive(Debug)]
pub struct TelemetryStore {
    caches: DashMap<String, Arc<DeviceCache>>,
    sessions: DashMap<String, SessionState>,
    clock: Arc<dyn Clock>,
}

impl TelemetryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            caches: DashMap::new(),
            sessions: DashMap::new(),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Apply one decoded update, timestamped with the store clock.
    pub fn apply(&self, device_id: &str, path: &DecodedPath, value: &TelemetryValue) -> Domain {
        self.apply_at(device_id, path, value, self.clock.now())
    }

    /// Apply one decoded update observed at `at`.
    pub fn apply_at(
        &self,
        device_id: &str,
        path: &DecodedPath,
        value: &TelemetryValue,
        at: DateTime<Utc>,
    ) -> Domain {
        let domain = self.mutate(device_id, at, |cache| apply::apply_update(cache, path, value, at));
        match domain {
            Domain::Unclassified => debug!(device = device_id, path = %path, "unclassified update ignored"),
            _ => trace!(device = device_id, path = %path, ?domain, "update applied"),
        }
        domain
    }

    /// Record activity without changing any telemetry field.
    pub fn touch(&self, device_id: &str) {
        let now = self.clock.now();
        self.mutate(device_id, now, |_| ());
    }

    /// Flag a device Disconnected, keeping its last-known values.
    ///
    /// Devices that never produced a cache stay without one.
    pub fn mark_disconnected(&self, device_id: &str) {
        if let Some(mut entry) = self.caches.get_mut(device_id) {
            if entry.status != DeviceStatus::Disconnected {
                Arc::make_mut(entry.value_mut()).status = DeviceStatus::Disconnected;
            }
        }
    }

    /// Flag every Connected device quiet for longer than `threshold` as
    /// Stale. Returns the ids that transitioned.
    pub fn mark_stale(&self, threshold: Duration, now: DateTime<Utc>) -> Vec<String> {
        let mut transitioned = Vec::new();
        for mut entry in self.caches.iter_mut() {
            let quiet = (now - entry.last_update)
                .to_std()
                .is_ok_and(|elapsed| elapsed > threshold);
            if entry.status == DeviceStatus::Connected && quiet {
                Arc::make_mut(entry.value_mut()).status = DeviceStatus::Stale;
                transitioned.push(entry.key().clone());
            }
        }
        transitioned
    }

    /// Publish the session state for a device.
    pub fn set_session(&self, device_id: &str, state: SessionState) {
        self.sessions.insert(device_id.to_owned(), state);
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Point-in-time copy of a device cache (cheap `Arc` clone).
    pub fn snapshot(&self, device_id: &str) -> Option<Arc<DeviceCache>> {
        self.caches.get(device_id).map(|r| Arc::clone(r.value()))
    }

    /// Current status; `Unknown` for devices that never sent a message.
    pub fn status(&self, device_id: &str) -> DeviceStatus {
        self.caches
            .get(device_id)
            .map_or(DeviceStatus::Unknown, |r| r.status)
    }

    pub fn session(&self, device_id: &str) -> Option<SessionState> {
        self.sessions.get(device_id).map(|r| r.value().clone())
    }

    pub fn device_ids(&self) -> Vec<String> {
        self.caches.iter().map(|r| r.key().clone()).collect()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Run `f` against a writable copy of the device cache, creating the
    /// cache on first use. Any message from the device marks it Connected.
    fn mutate<R>(&self, device_id: &str, at: DateTime<Utc>, f: impl FnOnce(&mut DeviceCache) -> R) -> R {
        let mut entry = self
            .caches
            .entry(device_id.to_owned())
            .or_insert_with(|| Arc::new(DeviceCache::new(device_id, at)));
        let cache = Arc::make_mut(entry.value_mut());
        let result = f(cache);
        cache.last_update = at;
        cache.status = DeviceStatus::Connected;
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::clock::ManualClock;
    use crate::model::OperState;

    fn store() -> (Arc<ManualClock>, TelemetryStore) {
        let clock = Arc::new(ManualClock::new(DateTime::UNIX_EPOCH));
        let store = TelemetryStore::new(clock.clone());
        (clock, store)
    }

    fn path(raw: &str) -> DecodedPath {
        DecodedPath::parse(raw).unwrap()
    }

    fn value(json: serde_json::Value) -> TelemetryValue {
        TelemetryValue::from(json)
    }

    #[test]
    fn cache_is_created_on_first_message() {
        let (_, store) = store();
        assert_eq!(store.status("leaf1"), DeviceStatus::Unknown);
        assert!(store.snapshot("leaf1").is_none());

        store.touch("leaf1");
        assert_eq!(store.status("leaf1"), DeviceStatus::Connected);
        assert!(store.snapshot("leaf1").is_some());
    }

    #[test]
    fn counter_rate_example() {
        let (clock, store) = store();
        let p = path("/interface[name=eth-1/1]/statistics/in-octets");

        store.apply("leaf1", &p, &TelemetryValue::Uint(1000));
        clock.advance(Duration::from_secs(5));
        store.apply("leaf1", &p, &TelemetryValue::Uint(2000));

        let snap = store.snapshot("leaf1").unwrap();
        let iface = snap.interface("eth-1/1").unwrap();
        assert_eq!(iface.in_octets, 2000);
        assert!((iface.in_rate - 1600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn in_and_out_counters_in_one_notification_both_get_rates() {
        let (clock, store) = store();
        let p = path("/interface[name=ethernet-1/1]/statistics");

        store.apply("leaf1", &p, &value(serde_json::json!({"in-octets": "0", "out-octets": "0"})));
        clock.advance(Duration::from_secs(2));
        store.apply("leaf1", &p, &value(serde_json::json!({"in-octets": "250", "out-octets": "500"})));

        let snap = store.snapshot("leaf1").unwrap();
        let iface = snap.interface("ethernet-1/1").unwrap();
        assert!((iface.in_rate - 1000.0).abs() < f64::EPSILON);
        assert!((iface.out_rate - 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn replay_at_same_instant_is_idempotent() {
        let (_, store) = store();
        let p = path("/interface[name=ethernet-1/1]");
        let v = value(serde_json::json!({
            "oper-state": "up",
            "statistics": {"in-octets": "100", "out-octets": "200"},
            "subinterface": [{"index": 0, "ipv4": {"address": [{"ip-prefix": "10.0.0.1/31"}]}}]
        }));

        store.apply("leaf1", &p, &v);
        let first = store.snapshot("leaf1").unwrap();
        store.apply("leaf1", &p, &v);
        let second = store.snapshot("leaf1").unwrap();

        assert_eq!(*first, *second);
        assert_eq!(second.interface("ethernet-1/1").unwrap().oper_state, OperState::Up);
    }

    #[test]
    fn readers_keep_their_snapshot_across_writes() {
        let (_, store) = store();
        let p = path("/interface[name=ethernet-1/1]/oper-state");

        store.apply("leaf1", &p, &TelemetryValue::String("up".into()));
        let before = store.snapshot("leaf1").unwrap();
        store.apply("leaf1", &p, &TelemetryValue::String("down".into()));

        assert_eq!(before.interface("ethernet-1/1").unwrap().oper_state, OperState::Up);
        assert_eq!(
            store.snapshot("leaf1").unwrap().interface("ethernet-1/1").unwrap().oper_state,
            OperState::Down
        );
    }

    #[test]
    fn disconnect_retains_values() {
        let (_, store) = store();
        store.apply(
            "leaf1",
            &path("/interface[name=ethernet-1/1]/oper-state"),
            &TelemetryValue::String("up".into()),
        );
        store.mark_disconnected("leaf1");
        store.mark_disconnected("never-seen");

        let snap = store.snapshot("leaf1").unwrap();
        assert_eq!(snap.status, DeviceStatus::Disconnected);
        assert!(snap.interface("ethernet-1/1").is_some());
        assert_eq!(store.status("never-seen"), DeviceStatus::Unknown);
    }

    #[test]
    fn stale_only_after_threshold_and_recovers_on_next_update() {
        let (clock, store) = store();
        store.touch("leaf1");
        let threshold = Duration::from_secs(30);

        clock.advance(Duration::from_secs(30));
        assert!(store.mark_stale(threshold, store.now()).is_empty());

        clock.advance(Duration::from_secs(1));
        assert_eq!(store.mark_stale(threshold, store.now()), ["leaf1"]);
        assert_eq!(store.status("leaf1"), DeviceStatus::Stale);
        assert!(store.mark_stale(threshold, store.now()).is_empty());

        store.touch("leaf1");
        assert_eq!(store.status("leaf1"), DeviceStatus::Connected);
    }

    #[test]
    fn disconnected_devices_are_not_marked_stale() {
        let (clock, store) = store();
        store.touch("leaf1");
        store.mark_disconnected("leaf1");
        clock.advance(Duration::from_secs(120));
        assert!(store.mark_stale(Duration::from_secs(30), store.now()).is_empty());
        assert_eq!(store.status("leaf1"), DeviceStatus::Disconnected);
    }

    #[test]
    fn session_state_is_published_independently_of_cache() {
        let (_, store) = store();
        store.set_session("leaf1", SessionState::connecting(1));
        assert_eq!(store.session("leaf1"), Some(SessionState::connecting(1)));
        assert_eq!(store.status("leaf1"), DeviceStatus::Unknown);
    }
}
