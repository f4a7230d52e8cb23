// Shared transport configuration for building gNMI channels.
//
// Every device session builds its channel through this module so the
// connect bound, per-call bound, and credential metadata stay uniform.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tonic::metadata::{AsciiMetadataValue, MetadataMap};
use tonic::transport::{Channel, Endpoint};

use crate::error::Error;

/// Credentials passed to the device as per-call gRPC metadata.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// Connection settings for one gNMI target.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Bound on establishing the HTTP/2 channel and on the initial
    /// Subscribe call.
    pub connect_timeout: Duration,
    /// Bound on unary calls (Capabilities).
    pub request_timeout: Duration,
    /// HTTP/2 keepalive ping interval for long-lived streams.
    pub keepalive_interval: Duration,
    pub credentials: Option<Credentials>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            keepalive_interval: Duration::from_secs(30),
            credentials: None,
        }
    }
}

impl TransportConfig {
    /// Build a lazily-connecting endpoint for `host:port` (plaintext h2c).
    pub fn endpoint(&self, host: &str, port: u16) -> Result<Endpoint, Error> {
        let uri = format!("http://{host}:{port}");
        let endpoint = Endpoint::from_shared(uri.clone()).map_err(|e| Error::InvalidEndpoint {
            endpoint: uri,
            reason: e.to_string(),
        })?;

        Ok(endpoint
            .connect_timeout(self.connect_timeout)
            .http2_keep_alive_interval(self.keepalive_interval)
            .keep_alive_while_idle(true)
            .tcp_nodelay(true))
    }

    /// Connect a channel, bounded by `connect_timeout`.
    pub async fn connect(&self, host: &str, port: u16) -> Result<Channel, Error> {
        let endpoint = self.endpoint(host, port)?;
        match tokio::time::timeout(self.connect_timeout, endpoint.connect()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(Error::timeout("connect", self.connect_timeout)),
        }
    }

    /// Write the `username` / `password` metadata pair, if configured.
    pub fn apply_credentials(&self, metadata: &mut MetadataMap) -> Result<(), Error> {
        let Some(creds) = &self.credentials else {
            return Ok(());
        };

        let username = AsciiMetadataValue::try_from(creds.username.as_str())
            .map_err(|e| Error::InvalidMetadata(format!("username: {e}")))?;
        let password = AsciiMetadataValue::try_from(creds.password.expose_secret())
            .map_err(|e| Error::InvalidMetadata(format!("password: {e}")))?;

        metadata.insert("username", username);
        metadata.insert("password", password);
        Ok(())
    }
}
