// ── Core error types ──
//
// User-facing errors from gridtel-core. Consumers never see gRPC status
// codes directly; the `From<gridtel_api::Error>` impl translates
// transport-layer failures into domain-appropriate variants.

use thiserror::Error;

use crate::decode::DecodeError;
use crate::model::DeviceStatus;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Transport errors ─────────────────────────────────────────────
    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    #[error("Device rejected credentials: {message}")]
    AuthenticationFailed { message: String },

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Failed to decode update: {0}")]
    Decode(#[from] DecodeError),

    #[error("Unknown device: {id}")]
    UnknownDevice { id: String },

    #[error("Unknown link: {id}")]
    UnknownLink { id: String },

    #[error("No telemetry available for {id} (status: {status})")]
    DataUnavailable { id: String, status: DeviceStatus },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<gridtel_api::Error> for CoreError {
    fn from(err: gridtel_api::Error) -> Self {
        if err.is_auth_rejected() {
            return CoreError::AuthenticationFailed {
                message: err.to_string(),
            };
        }
        match err {
            gridtel_api::Error::InvalidEndpoint { .. } | gridtel_api::Error::InvalidMetadata(_) => {
                CoreError::Config {
                    message: err.to_string(),
                }
            }
            gridtel_api::Error::Timeout {
                operation,
                timeout_ms,
            } => CoreError::Timeout {
                operation,
                timeout_ms,
            },
            gridtel_api::Error::Transport(_)
            | gridtel_api::Error::Status { .. }
            | gridtel_api::Error::StreamEnded => CoreError::Transport {
                reason: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn auth_status_maps_to_authentication_failed() {
        let err = CoreError::from(gridtel_api::Error::Status {
            code: gridtel_api::StatusCode::Unauthenticated,
            message: "bad password".into(),
        });
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }

    #[test]
    fn stream_end_maps_to_transport() {
        let err = CoreError::from(gridtel_api::Error::StreamEnded);
        assert!(matches!(err, CoreError::Transport { .. }));
        assert_eq!(
            err.to_string(),
            "Transport failure: Subscription stream ended by device"
        );
    }

    #[test]
    fn timeout_keeps_operation_and_bound() {
        let err = CoreError::from(gridtel_api::Error::timeout("subscribe", Duration::from_secs(10)));
        assert_eq!(err.to_string(), "subscribe timed out after 10000ms");
    }

    #[test]
    fn invalid_endpoint_is_a_config_error() {
        let err = CoreError::from(gridtel_api::Error::InvalidEndpoint {
            endpoint: "http://bad host:1".into(),
            reason: "invalid uri character".into(),
        });
        assert!(matches!(err, CoreError::Config { .. }));
    }
}
