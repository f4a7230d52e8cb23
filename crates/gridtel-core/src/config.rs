// ── Runtime collector configuration ──
//
// These types describe *what* to collect from and *how often*. They carry
// credential data and timing, but never touch disk. The binary builds
// them through `gridtel-config` and hands them in.

use std::time::Duration;

use gridtel_api::{Credentials, TransportConfig};
use indexmap::IndexMap;

use crate::error::CoreError;
use crate::model::DeviceRole;
use crate::session::BackoffPolicy;

/// A streaming telemetry source.
#[derive(Debug, Clone)]
pub struct Device {
    pub id: String,
    /// Display name.
    pub name: String,
    pub host: String,
    pub port: u16,
    pub role: DeviceRole,
    pub credentials: Option<Credentials>,
}

/// One side of a link: an interface on a configured device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEndpoint {
    pub device: String,
    pub interface: String,
}

/// A physical link between two device interfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: String,
    pub a: LinkEndpoint,
    pub b: LinkEndpoint,
}

/// Collector timing knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Sample interval requested for every subscribed path.
    pub sample_interval: Duration,
    /// Bound on establishing a subscription.
    pub connect_timeout: Duration,
    /// Bound on unary calls.
    pub request_timeout: Duration,
    pub keepalive_interval: Duration,
    pub backoff: BackoffPolicy,
    /// How often the staleness sweep runs.
    pub stale_check_interval: Duration,
    /// Quiet time after which a connected device is flagged stale.
    pub stale_threshold: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            keepalive_interval: Duration::from_secs(30),
            backoff: BackoffPolicy::default(),
            stale_check_interval: Duration::from_secs(10),
            stale_threshold: Duration::from_secs(30),
        }
    }
}

impl CollectorConfig {
    /// Transport settings for one device.
    pub fn transport(&self, credentials: Option<Credentials>) -> TransportConfig {
        TransportConfig {
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
            keepalive_interval: self.keepalive_interval,
            credentials,
        }
    }
}

/// The immutable device and link inventory, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    devices: IndexMap<String, Device>,
    links: IndexMap<String, Link>,
}

impl Roster {
    /// Build a roster, rejecting duplicate ids and links that reference
    /// unknown devices.
    pub fn new(devices: Vec<Device>, links: Vec<Link>) -> Result<Self, CoreError> {
        let mut by_id = IndexMap::with_capacity(devices.len());
        for device in devices {
            if by_id.contains_key(&device.id) {
                return Err(CoreError::Config {
                    message: format!("duplicate device id '{}'", device.id),
                });
            }
            by_id.insert(device.id.clone(), device);
        }

        let mut links_by_id = IndexMap::with_capacity(links.len());
        for link in links {
            for end in [&link.a, &link.b] {
                if !by_id.contains_key(&end.device) {
                    return Err(CoreError::Config {
                        message: format!(
                            "link '{}' references unknown device '{}'",
                            link.id, end.device
                        ),
                    });
                }
            }
            if links_by_id.contains_key(&link.id) {
                return Err(CoreError::Config {
                    message: format!("duplicate link id '{}'", link.id),
                });
            }
            links_by_id.insert(link.id.clone(), link);
        }

        Ok(Self {
            devices: by_id,
            links: links_by_id,
        })
    }

    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.links.get(id)
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}
