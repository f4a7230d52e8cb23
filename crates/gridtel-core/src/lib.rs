//! Telemetry ingestion and caching between `gridtel-api` and the HTTP/CLI
//! consumers.
//!
//! This crate owns the device model, the live cache, and every background
//! task of the collector:
//!
//! - **[`Collector`]**: Lifecycle facade. [`start()`](Collector::start)
//!   spawns one [`StreamSession`] per configured device plus the
//!   [`StalenessSupervisor`]; [`shutdown()`](Collector::shutdown) cancels
//!   and joins them.
//!
//! - **[`StreamSession`]**: One persistent gNMI subscription with a
//!   connect → stream → backoff state machine. Generic over a [`Dialer`]
//!   so tests can script the transport.
//!
//! - **[`decode`]**: Schema-free decoding of wire paths and typed values
//!   into [`DecodedPath`] and [`TelemetryValue`].
//!
//! - **[`TelemetryStore`]**: `DashMap<String, Arc<DeviceCache>>` with one
//!   copy-on-write swap per update. Updates are routed by an ordered rule
//!   table ([`store::classify`]) into interface, system, BGP, and route
//!   state.
//!
//! - **[`SnapshotApi`]**: Read-only, point-in-time projections (device
//!   list, interfaces, system, BGP, routes, links, aggregate stats).
//!
//! - **[`Clock`]**: Injectable wall clock; [`ManualClock`] drives
//!   staleness and rate tests deterministically.

pub mod clock;
pub mod collector;
pub mod config;
pub mod decode;
pub mod error;
pub mod model;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod supervisor;

// ── Primary re-exports ──────────────────────────────────────────────
pub use clock::{Clock, ManualClock, SystemClock};
pub use collector::Collector;
pub use config::{CollectorConfig, Device, Link, LinkEndpoint, Roster};
pub use decode::{DecodeError, DecodedPath, DecodedUpdate, PathSegment, TelemetryValue, decode_update};
pub use error::CoreError;
pub use session::{
    Backoff, BackoffPolicy, Dialer, GnmiDialer, PROFILE_VERSION, ResponseStream, StreamSession,
};
pub use snapshot::{
    AggregateStats, DeviceSummary, HealthReport, InterfaceListing, LinkEndpointStatus, LinkState,
    LinkStatus, RouteListing, SnapshotApi,
};
pub use store::TelemetryStore;
pub use supervisor::StalenessSupervisor;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    BgpPeer, BgpSummary, DeviceCache, DeviceRole, DeviceStatus, InterfaceRecord, OperState,
    SessionState, StreamState, SystemMetrics,
};
