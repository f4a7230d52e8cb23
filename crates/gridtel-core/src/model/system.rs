// ── Platform metrics ──

use serde::Serialize;

/// CPU, memory, and management address of a device.
///
/// Fields stay `None` until the device reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub cpu_percent: Option<f64>,
    pub memory_utilization_percent: Option<f64>,
    pub memory_physical_bytes: Option<u64>,
    pub memory_used_bytes: Option<u64>,
    pub memory_free_bytes: Option<u64>,
    /// Address of `system0` or `mgmt0`, without prefix length.
    pub management_ip: Option<String>,
}

impl SystemMetrics {
    /// Utilization implied by used/physical, when both are known.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn derived_memory_utilization(&self) -> Option<f64> {
        match (self.memory_used_bytes, self.memory_physical_bytes) {
            (Some(used), Some(physical)) if physical > 0 => {
                Some(used as f64 / physical as f64 * 100.0)
            }
            _ => None,
        }
    }
}
