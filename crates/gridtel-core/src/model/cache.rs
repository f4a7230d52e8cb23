// ── Per-device cache ──

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use super::bgp::BgpSummary;
use super::device::DeviceStatus;
use super::interface::InterfaceRecord;
use super::system::SystemMetrics;

/// Everything known about one device.
///
/// Created on the first message from the device and never removed; a
/// disconnect flips `status` but keeps the last-known values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCache {
    pub device_id: String,
    pub status: DeviceStatus,
    pub last_update: DateTime<Utc>,
    pub interfaces: IndexMap<String, InterfaceRecord>,
    pub system: SystemMetrics,
    pub bgp: BgpSummary,
    /// BGP-learned route prefixes in first-seen order.
    pub routes: IndexSet<String>,
}

impl DeviceCache {
    pub fn new(device_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            device_id: device_id.into(),
            status: DeviceStatus::Connected,
            last_update: now,
            interfaces: IndexMap::new(),
            system: SystemMetrics::default(),
            bgp: BgpSummary::default(),
            routes: IndexSet::new(),
        }
    }

    /// Upsert an interface record by base name.
    pub fn interface_mut(&mut self, name: &str) -> &mut InterfaceRecord {
        self.interfaces
            .entry(name.to_owned())
            .or_insert_with(|| InterfaceRecord::new(name))
    }

    pub fn interface(&self, name: &str) -> Option<&InterfaceRecord> {
        self.interfaces.get(name)
    }
}
