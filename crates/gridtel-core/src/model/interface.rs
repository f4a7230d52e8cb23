// ── Interface telemetry ──

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::Serialize;
use strum::Display;

/// Operational state of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OperState {
    Up,
    Down,
    #[default]
    Unknown,
}

impl OperState {
    /// Map a device-reported oper-state onto the three-valued model.
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "up" => Self::Up,
            "down" | "lower-layer-down" | "not-present" | "dormant" => Self::Down,
            _ => Self::Unknown,
        }
    }
}

/// Latest state of one physical interface, keyed by base name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRecord {
    pub name: String,
    pub oper_state: OperState,
    /// Unique IP prefixes in first-seen order.
    pub ip_addresses: IndexSet<String>,
    pub in_octets: u64,
    pub out_octets: u64,
    /// Bits per second, derived from consecutive `in_octets` samples.
    pub in_rate: f64,
    /// Bits per second, derived from consecutive `out_octets` samples.
    pub out_rate: f64,
    pub in_errors: u64,
    pub out_errors: u64,
    pub last_sample_time: Option<DateTime<Utc>>,
    #[serde(skip)]
    in_sampled_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    out_sampled_at: Option<DateTime<Utc>>,
}

impl InterfaceRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            oper_state: OperState::Unknown,
            ip_addresses: IndexSet::new(),
            in_octets: 0,
            out_octets: 0,
            in_rate: 0.0,
            out_rate: 0.0,
            in_errors: 0,
            out_errors: 0,
            last_sample_time: None,
            in_sampled_at: None,
            out_sampled_at: None,
        }
    }

    /// Record an inbound octet counter sample.
    pub fn observe_in_octets(&mut self, octets: u64, at: DateTime<Utc>) {
        observe_counter(
            &mut self.in_octets,
            &mut self.in_rate,
            &mut self.in_sampled_at,
            octets,
            at,
        );
        self.last_sample_time = Some(at);
    }

    /// Record an outbound octet counter sample.
    pub fn observe_out_octets(&mut self, octets: u64, at: DateTime<Utc>) {
        observe_counter(
            &mut self.out_octets,
            &mut self.out_rate,
            &mut self.out_sampled_at,
            octets,
            at,
        );
        self.last_sample_time = Some(at);
    }

    /// Append a prefix unless already present. Returns `true` if new.
    pub fn add_ip(&mut self, prefix: &str) -> bool {
        if self.ip_addresses.contains(prefix) {
            return false;
        }
        self.ip_addresses.insert(prefix.to_owned())
    }

    pub fn has_traffic(&self) -> bool {
        self.in_octets > 0 || self.out_octets > 0
    }
}

/// Fold a new counter sample into `counter`/`rate`.
///
/// The rate moves only when a prior sample exists, time has advanced, and
/// the counter did not go backwards. The counter and sample time are
/// always replaced, so a reset re-seeds the next window.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn observe_counter(
    counter: &mut u64,
    rate: &mut f64,
    sampled_at: &mut Option<DateTime<Utc>>,
    value: u64,
    at: DateTime<Utc>,
) {
    if let Some(elapsed) = sampled_at.and_then(|prev_at| (at - prev_at).to_std().ok()) {
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 && value >= *counter {
            *rate = 8.0 * (value - *counter) as f64 / secs;
        }
    }
    *counter = value;
    *sampled_at = Some(at);
}
