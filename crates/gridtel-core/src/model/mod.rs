// ── Telemetry domain model ──
//
// Normalized per-device state served to consumers. Every type here is
// independent of the gNMI wire format.

pub mod bgp;
pub mod cache;
pub mod device;
pub mod interface;
pub mod session;
pub mod system;

pub use bgp::{BgpPeer, BgpSummary, ESTABLISHED};
pub use cache::DeviceCache;
pub use device::{DeviceRole, DeviceStatus};
pub use interface::{InterfaceRecord, OperState};
pub use session::{SessionState, StreamState};
pub use system::SystemMetrics;
