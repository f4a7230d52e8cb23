// ── Device-level domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Position of a device in the fabric.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceRole {
    Spine,
    Leaf,
    #[default]
    Other,
}

/// Telemetry freshness of a device, as seen by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceStatus {
    /// Receiving updates.
    Connected,
    /// Subscription believed open, but quiet past the staleness threshold.
    Stale,
    /// Subscription failed; last-known values are retained.
    Disconnected,
    /// Nothing received yet.
    Unknown,
}

impl DeviceStatus {
    /// Connected and stale devices both count as active.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Connected | Self::Stale)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!(DeviceRole::from_str("Spine").unwrap(), DeviceRole::Spine);
        assert_eq!(DeviceRole::from_str("leaf").unwrap(), DeviceRole::Leaf);
        assert!(DeviceRole::from_str("rtu").is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DeviceStatus::Disconnected).unwrap(),
            "\"disconnected\""
        );
        assert_eq!(DeviceStatus::Stale.to_string(), "stale");
        assert!(DeviceStatus::Stale.is_active());
        assert!(!DeviceStatus::Unknown.is_active());
    }
}
