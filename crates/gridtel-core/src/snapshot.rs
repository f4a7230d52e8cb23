// ── Snapshot queries ──
//
// Read-only projections over the store for the HTTP layer and CLI. Every
// call works on `Arc` snapshots and never blocks a session.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

use crate::config::{Device, LinkEndpoint, Roster};
use crate::error::CoreError;
use crate::model::{
    BgpSummary, DeviceCache, DeviceRole, DeviceStatus, InterfaceRecord, OperState, SessionState,
    SystemMetrics,
};
use crate::store::TelemetryStore;

/// Name fragments that keep an address-less, traffic-less interface in
/// the filtered listing.
const INFRASTRUCTURE_MARKERS: [&str; 2] = ["mgmt", "system"];

// ── Response types ───────────────────────────────────────────────────

/// Roster entry plus live status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    pub id: String,
    pub name: String,
    pub role: DeviceRole,
    pub host: String,
    pub port: u16,
    pub status: DeviceStatus,
    pub last_update: Option<DateTime<Utc>>,
    pub session: Option<SessionState>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceListing {
    pub interfaces: Vec<InterfaceRecord>,
    /// Interfaces known before filtering.
    pub total: usize,
    /// Interfaces returned.
    pub filtered: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteListing {
    pub routes: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LinkState {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEndpointStatus {
    pub device_id: String,
    pub device_name: String,
    pub interface: String,
    pub state: OperState,
    /// The endpoint's device is Connected or Stale.
    pub device_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkStatus {
    pub id: String,
    pub status: LinkState,
    pub a: LinkEndpointStatus,
    pub b: LinkEndpointStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    pub total: usize,
    pub active: usize,
    /// `active / total` as a whole percentage, rounded half up.
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub devices: BTreeMap<String, DeviceStatus>,
}

// ── SnapshotApi ──────────────────────────────────────────────────────

/// Query facade over the configured roster and the live store.
#[derive(Debug, Clone)]
pub struct SnapshotApi {
    roster: Arc<Roster>,
    store: Arc<TelemetryStore>,
}

impl SnapshotApi {
    pub fn new(roster: Arc<Roster>, store: Arc<TelemetryStore>) -> Self {
        Self { roster, store }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Every configured device in roster order, including those that
    /// never connected.
    pub fn list_devices(&self) -> Vec<DeviceSummary> {
        self.roster
            .devices()
            .map(|device| {
                let cache = self.store.snapshot(&device.id);
                DeviceSummary {
                    id: device.id.clone(),
                    name: device.name.clone(),
                    role: device.role,
                    host: device.host.clone(),
                    port: device.port,
                    status: cache.as_ref().map_or(DeviceStatus::Unknown, |c| c.status),
                    last_update: cache.as_ref().map(|c| c.last_update),
                    session: self.store.session(&device.id),
                }
            })
            .collect()
    }

    /// Interfaces worth showing: anything addressed, plus up interfaces
    /// that carry traffic or look like management/system ports.
    pub fn get_interfaces(&self, device_id: &str) -> Result<InterfaceListing, CoreError> {
        let cache = self.available(device_id)?;
        let interfaces: Vec<InterfaceRecord> = cache
            .interfaces
            .values()
            .filter(|iface| is_listed(iface))
            .cloned()
            .collect();
        Ok(InterfaceListing {
            total: cache.interfaces.len(),
            filtered: interfaces.len(),
            interfaces,
        })
    }

    pub fn get_system(&self, device_id: &str) -> Result<SystemMetrics, CoreError> {
        Ok(self.available(device_id)?.system.clone())
    }

    pub fn get_bgp(&self, device_id: &str) -> Result<BgpSummary, CoreError> {
        Ok(self.available(device_id)?.bgp.clone())
    }

    pub fn get_routes(&self, device_id: &str) -> Result<RouteListing, CoreError> {
        let cache = self.available(device_id)?;
        Ok(RouteListing {
            routes: cache.routes.iter().cloned().collect(),
            total: cache.routes.len(),
        })
    }

    /// A link is up only when both endpoint interfaces report up.
    pub fn get_link_status(&self, link_id: &str) -> Result<LinkStatus, CoreError> {
        let link = self.roster.link(link_id).ok_or_else(|| CoreError::UnknownLink {
            id: link_id.to_owned(),
        })?;
        let a = self.endpoint_status(&link.a);
        let b = self.endpoint_status(&link.b);
        let status = if a.state == OperState::Up && b.state == OperState::Up {
            LinkState::Up
        } else {
            LinkState::Down
        };
        Ok(LinkStatus {
            id: link.id.clone(),
            status,
            a,
            b,
        })
    }

    /// All links in configuration order.
    pub fn list_links(&self) -> Vec<LinkStatus> {
        self.roster
            .links()
            .filter_map(|link| self.get_link_status(&link.id).ok())
            .collect()
    }

    /// Share of configured devices that are Connected or Stale.
    pub fn get_aggregate_stats(&self) -> AggregateStats {
        let total = self.roster.device_count();
        let active = self
            .roster
            .devices()
            .filter(|d| self.store.status(&d.id).is_active())
            .count();
        AggregateStats {
            total,
            active,
            percentage: rounded_percentage(active, total),
        }
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok",
            devices: self
                .roster
                .devices()
                .map(|d| (d.id.clone(), self.store.status(&d.id)))
                .collect(),
        }
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn device(&self, device_id: &str) -> Result<&Device, CoreError> {
        self.roster.device(device_id).ok_or_else(|| CoreError::UnknownDevice {
            id: device_id.to_owned(),
        })
    }

    /// The device's cache, if it is configured and currently servable.
    /// Stale data is served; disconnected or never-seen devices are not.
    fn available(&self, device_id: &str) -> Result<Arc<DeviceCache>, CoreError> {
        let device = self.device(device_id)?;
        match self.store.snapshot(&device.id) {
            Some(cache) if cache.status.is_active() => Ok(cache),
            Some(cache) => Err(CoreError::DataUnavailable {
                id: device.id.clone(),
                status: cache.status,
            }),
            None => Err(CoreError::DataUnavailable {
                id: device.id.clone(),
                status: DeviceStatus::Unknown,
            }),
        }
    }

    fn endpoint_status(&self, end: &LinkEndpoint) -> LinkEndpointStatus {
        let cache = self.store.snapshot(&end.device);
        let state = cache
            .as_ref()
            .and_then(|c| c.interface(&end.interface))
            .map_or(OperState::Unknown, |iface| iface.oper_state);
        LinkEndpointStatus {
            device_id: end.device.clone(),
            device_name: self
                .roster
                .device(&end.device)
                .map_or_else(|| end.device.clone(), |d| d.name.clone()),
            interface: end.interface.clone(),
            state,
            device_active: cache.is_some_and(|c| c.status.is_active()),
        }
    }
}

fn is_listed(iface: &InterfaceRecord) -> bool {
    if !iface.ip_addresses.is_empty() {
        return true;
    }
    iface.oper_state == OperState::Up
        && (iface.has_traffic()
            || INFRASTRUCTURE_MARKERS
                .iter()
                .any(|marker| iface.name.contains(marker)))
}

/// `round(100 * active / total)` with halves rounded up; 0 when empty.
fn rounded_percentage(active: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = (200 * active + total) / (2 * total);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}
