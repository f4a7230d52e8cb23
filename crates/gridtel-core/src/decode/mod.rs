// ── Path and value decoding ──
//
// Turns raw gNMI paths and `TypedValue`s into schema-free normalized
// forms: typed path segments plus a recursive `TelemetryValue`. Pure and
// stateless; the store classifies and interprets the result.

mod path;
mod value;

use gridtel_api::proto::{Path, Update};
use thiserror::Error;

pub use path::{DecodedPath, PathSegment};
pub use value::TelemetryValue;
pub(crate) use value::local_name;

/// A single update that failed to decode. Never fatal to a stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("Update carries no value")]
    EmptyValue,

    #[error("JSON payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("Unsupported value encoding: {0}")]
    Unsupported(&'static str),
}

/// A decoded path/value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedUpdate {
    pub path: DecodedPath,
    pub value: TelemetryValue,
}

/// Decode one update, joining the notification prefix onto its path.
pub fn decode_update(prefix: Option<&Path>, update: &Update) -> Result<DecodedUpdate, DecodeError> {
    let path = DecodedPath::from_proto(prefix, update.path.as_ref());
    let value = TelemetryValue::from_typed(update.val.as_ref())?;
    Ok(DecodedUpdate { path, value })
}
