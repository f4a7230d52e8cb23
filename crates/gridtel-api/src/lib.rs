// gridtel-api: Async gNMI client for streaming telemetry (Subscribe + Capabilities)

pub mod client;
pub mod error;
pub mod proto;
pub mod transport;

pub use client::{GnmiClient, SubscribeStream};
pub use error::Error;
pub use tonic::Code as StatusCode;
pub use transport::{Credentials, TransportConfig};
