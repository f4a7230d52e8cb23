//! CLI error types with miette diagnostics.
//!
//! Maps `ConfigError` and `CoreError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use gridtel_config::ConfigError;
use gridtel_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(gridtel::no_config),
        help(
            "Pass --config <FILE> or create one at the default location.\n\
             See gridtel.example.toml for a starting point."
        )
    )]
    NoConfig { path: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(gridtel::validation))]
    Validation { field: String, reason: String },

    #[error("No password resolvable for device '{device}'")]
    #[diagnostic(
        code(gridtel::no_credentials),
        help(
            "Set `password_env` to the name of an exported variable, or `password`,\n\
             in the device entry or the [credentials] section."
        )
    )]
    NoCredentials { device: String },

    #[error(transparent)]
    #[diagnostic(code(gridtel::config))]
    Config(Box<figment::Error>),

    #[error("Device '{id}' is not in the configuration")]
    #[diagnostic(
        code(gridtel::unknown_device),
        help("Run: gridtel check to list configured devices")
    )]
    UnknownDevice { id: String },

    // ── Device access ────────────────────────────────────────────────
    #[error("Could not reach device: {reason}")]
    #[diagnostic(
        code(gridtel::connection_failed),
        help("Check that gNMI is enabled on the device and the host/port are reachable.")
    )]
    ConnectionFailed { reason: String },

    #[error("Device rejected credentials")]
    #[diagnostic(code(gridtel::auth_failed), help("{message}"))]
    AuthFailed { message: String },

    #[error("{operation} timed out after {timeout_ms}ms")]
    #[diagnostic(
        code(gridtel::timeout),
        help("Raise collector.request_timeout_secs or check device responsiveness.")
    )]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    // ── Runtime ──────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(gridtel::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoConfig { .. } | Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            Self::NoCredentials { .. } | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::UnknownDevice { .. } => exit_code::NOT_FOUND,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Internal(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { device } => Self::NoCredentials { device },
            ConfigError::NotFound { path } => Self::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Figment(err) => Self::Config(err),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport { reason } => Self::ConnectionFailed { reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout {
                operation,
                timeout_ms,
            } => Self::Timeout {
                operation,
                timeout_ms,
            },
            CoreError::UnknownDevice { id } => Self::UnknownDevice { id },
            CoreError::Config { message } => Self::Validation {
                field: "device".into(),
                reason: message,
            },
            other @ (CoreError::Decode(_)
            | CoreError::UnknownLink { .. }
            | CoreError::DataUnavailable { .. }
            | CoreError::Internal(_)) => Self::Internal(other.to_string()),
        }
    }
}
