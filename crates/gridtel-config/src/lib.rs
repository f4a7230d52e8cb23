//! Configuration for the gridtel collector.
//!
//! A TOML file merged with `GRIDTEL_`-prefixed environment variables,
//! validated once at startup, and translated into the immutable
//! `gridtel_core` roster and collector settings. Nothing here is mutated
//! after load.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use gridtel_api::Credentials;
use gridtel_core::{BackoffPolicy, CollectorConfig, Device, DeviceRole, Link, LinkEndpoint, Roster};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix; nested keys are separated by `__`
/// (`GRIDTEL_SERVER__LISTEN`).
pub const ENV_PREFIX: &str = "GRIDTEL_";

/// Prefixed variables read by the binary's flags, not the config tree.
const CLI_ONLY_VARS: &[&str] = &["config", "log_format"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password resolvable for device '{device}'")]
    NoCredentials { device: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<gridtel_core::CoreError> for ConfigError {
    fn from(err: gridtel_core::CoreError) -> Self {
        Self::Validation {
            field: "roster".into(),
            reason: err.to_string(),
        }
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub collector: CollectorSection,

    #[serde(default)]
    pub server: ServerSection,

    /// Credentials applied to devices that do not set their own.
    #[serde(default)]
    pub credentials: CredentialSection,

    /// Devices in the order they are listed.
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,

    #[serde(default)]
    pub links: Vec<LinkEntry>,
}

/// Collector timings, in seconds.
#[derive(Debug, Deserialize, Serialize)]
pub struct CollectorSection {
    #[serde(default = "default_sample_interval")]
    pub sample_interval_secs: u64,

    #[serde(default = "default_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,

    #[serde(default = "default_backoff_base")]
    pub backoff_base_secs: u64,

    #[serde(default = "default_backoff_max")]
    pub backoff_max_secs: u64,

    #[serde(default = "default_stale_check")]
    pub stale_check_interval_secs: u64,

    #[serde(default = "default_stale_threshold")]
    pub stale_threshold_secs: u64,
}

impl Default for CollectorSection {
    fn default() -> Self {
        Self {
            sample_interval_secs: default_sample_interval(),
            connect_timeout_secs: default_timeout(),
            request_timeout_secs: default_timeout(),
            keepalive_secs: default_keepalive(),
            backoff_base_secs: default_backoff_base(),
            backoff_max_secs: default_backoff_max(),
            stale_check_interval_secs: default_stale_check(),
            stale_threshold_secs: default_stale_threshold(),
        }
    }
}

fn default_sample_interval() -> u64 {
    5
}
fn default_timeout() -> u64 {
    10
}
fn default_keepalive() -> u64 {
    30
}
fn default_backoff_base() -> u64 {
    5
}
fn default_backoff_max() -> u64 {
    60
}
fn default_stale_check() -> u64 {
    10
}
fn default_stale_threshold() -> u64 {
    30
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerSection {
    /// HTTP listen address for the snapshot API.
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}

/// Username plus a password given directly or via an environment
/// variable name. The variable wins when both are set and present.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct CredentialSection {
    pub username: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Plaintext password (prefer `password_env`).
    pub password: Option<String>,
}

/// One gNMI target.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceEntry {
    pub id: String,

    /// Display name; defaults to the id.
    pub name: Option<String>,

    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub role: DeviceRole,

    /// Per-device credential overrides.
    #[serde(flatten)]
    pub credentials: CredentialSection,
}

fn default_port() -> u16 {
    57400
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkEntry {
    pub id: String,
    pub a: EndpointEntry,
    pub b: EndpointEntry,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointEntry {
    pub device: String,
    pub interface: String,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the default config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "gridtel", "gridtel").map_or_else(
        || PathBuf::from("gridtel.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load defaults, then the TOML file, then the environment.
///
/// An explicitly given path must exist; the default path may be absent.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::NotFound {
                path: p.to_path_buf(),
            });
        }
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(CLI_ONLY_VARS)
                .split("__"),
        );

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Validation and translation ──────────────────────────────────────

impl Config {
    /// Structural checks that do not need the environment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.collector;
        for (field, value) in [
            ("collector.sample_interval_secs", c.sample_interval_secs),
            ("collector.connect_timeout_secs", c.connect_timeout_secs),
            ("collector.request_timeout_secs", c.request_timeout_secs),
            ("collector.keepalive_secs", c.keepalive_secs),
            ("collector.backoff_base_secs", c.backoff_base_secs),
            ("collector.backoff_max_secs", c.backoff_max_secs),
            ("collector.stale_check_interval_secs", c.stale_check_interval_secs),
            ("collector.stale_threshold_secs", c.stale_threshold_secs),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero"));
            }
        }
        if c.backoff_max_secs < c.backoff_base_secs {
            return Err(invalid(
                "collector.backoff_max_secs",
                "must not be smaller than backoff_base_secs",
            ));
        }

        self.listen_addr()?;

        if self.devices.is_empty() {
            return Err(invalid("devices", "at least one device is required"));
        }
        let mut ids = HashSet::new();
        for device in &self.devices {
            if device.id.trim().is_empty() {
                return Err(invalid("devices.id", "must not be empty"));
            }
            if !ids.insert(device.id.as_str()) {
                return Err(invalid("devices.id", format!("duplicate device '{}'", device.id)));
            }
            if device.host.trim().is_empty() {
                return Err(invalid(format!("devices.{}.host", device.id), "must not be empty"));
            }
            if device.port == 0 {
                return Err(invalid(format!("devices.{}.port", device.id), "must not be zero"));
            }
        }

        let mut link_ids = HashSet::new();
        for link in &self.links {
            if !link_ids.insert(link.id.as_str()) {
                return Err(invalid("links.id", format!("duplicate link '{}'", link.id)));
            }
            for end in [&link.a, &link.b] {
                if !ids.contains(end.device.as_str()) {
                    return Err(invalid(
                        format!("links.{}", link.id),
                        format!("unknown device '{}'", end.device),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .listen
            .parse()
            .map_err(|_| invalid("server.listen", format!("not a socket address: {}", self.server.listen)))
    }

    pub fn collector_config(&self) -> CollectorConfig {
        let c = &self.collector;
        CollectorConfig {
            sample_interval: Duration::from_secs(c.sample_interval_secs),
            connect_timeout: Duration::from_secs(c.connect_timeout_secs),
            request_timeout: Duration::from_secs(c.request_timeout_secs),
            keepalive_interval: Duration::from_secs(c.keepalive_secs),
            backoff: BackoffPolicy {
                base: Duration::from_secs(c.backoff_base_secs),
                ceiling: Duration::from_secs(c.backoff_max_secs),
            },
            stale_check_interval: Duration::from_secs(c.stale_check_interval_secs),
            stale_threshold: Duration::from_secs(c.stale_threshold_secs),
        }
    }

    /// Build the device roster, resolving each device's credentials.
    pub fn roster(&self) -> Result<Roster, ConfigError> {
        let devices = self
            .devices
            .iter()
            .map(|entry| {
                Ok(Device {
                    id: entry.id.clone(),
                    name: entry.name.clone().unwrap_or_else(|| entry.id.clone()),
                    host: entry.host.clone(),
                    port: entry.port,
                    role: entry.role,
                    credentials: resolve_credentials(entry, &self.credentials)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let links = self
            .links
            .iter()
            .map(|entry| Link {
                id: entry.id.clone(),
                a: LinkEndpoint {
                    device: entry.a.device.clone(),
                    interface: entry.a.interface.clone(),
                },
                b: LinkEndpoint {
                    device: entry.b.device.clone(),
                    interface: entry.b.interface.clone(),
                },
            })
            .collect();

        Ok(Roster::new(devices, links)?)
    }

    pub fn device(&self, id: &str) -> Option<&DeviceEntry> {
        self.devices.iter().find(|d| d.id == id)
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a device's credentials, falling back to the shared section.
///
/// No username anywhere means the device is polled without credentials.
/// A username without a resolvable password is an error.
pub fn resolve_credentials(
    device: &DeviceEntry,
    defaults: &CredentialSection,
) -> Result<Option<Credentials>, ConfigError> {
    let own = &device.credentials;
    let Some(username) = own.username.as_ref().or(defaults.username.as_ref()) else {
        return Ok(None);
    };

    // Device settings first, then shared; within each, env var before plaintext.
    for section in [own, defaults] {
        if let Some(password) = section
            .password_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok())
            .or_else(|| section.password.clone())
        {
            return Ok(Some(Credentials {
                username: username.clone(),
                password: SecretString::from(password),
            }));
        }
    }

    Err(ConfigError::NoCredentials {
        device: device.id.clone(),
    })
}
