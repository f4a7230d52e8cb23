use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `gridtel-api` crate.
///
/// Covers every failure mode of the gNMI transport: endpoint setup,
/// connection, call status, stream termination, and timeouts.
/// `gridtel-core` maps these into session-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Endpoint ────────────────────────────────────────────────────
    /// The device address could not be turned into a gRPC endpoint.
    #[error("Invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Credentials could not be encoded as gRPC metadata.
    #[error("Invalid credential metadata: {0}")]
    InvalidMetadata(String),

    // ── Transport ───────────────────────────────────────────────────
    /// Channel-level failure (connection refused, DNS, h2 handshake).
    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The device answered with a non-OK gRPC status.
    #[error("gRPC call failed ({code:?}): {message}")]
    Status { code: tonic::Code, message: String },

    /// An operation exceeded its time bound.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    // ── Stream ──────────────────────────────────────────────────────
    /// The device closed the subscription stream.
    #[error("Subscription stream ended by device")]
    StreamEnded,
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        Self::Status {
            code: status.code(),
            message: status.message().to_owned(),
        }
    }
}

impl Error {
    /// Build a [`Error::Timeout`] from the bound that was exceeded.
    pub fn timeout(operation: &'static str, timeout: Duration) -> Self {
        Self::Timeout {
            operation,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Returns `true` if the device rejected the supplied credentials.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(
            self,
            Self::Status {
                code: tonic::Code::Unauthenticated | tonic::Code::PermissionDenied,
                ..
            }
        )
    }

    /// Returns `true` for failures expected to clear without operator action.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } | Self::StreamEnded => true,
            Self::Status { code, .. } => matches!(
                code,
                tonic::Code::Unavailable
                    | tonic::Code::DeadlineExceeded
                    | tonic::Code::ResourceExhausted
                    | tonic::Code::Aborted
                    | tonic::Code::Internal
                    | tonic::Code::Unknown
            ),
            Self::InvalidEndpoint { .. } | Self::InvalidMetadata(_) => false,
        }
    }
}
