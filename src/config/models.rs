//! Configuration data structures for the server.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files.
//! They are serde-friendly with defaults so minimal configs stay concise, and
//! the builder methods are part of the public API for embedding. A config is
//! constructed once, before `start`, and never mutated afterwards.
use std::{
    net::{AddrParseError, IpAddr, SocketAddr},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Stop policy applied by `stop()` on a running server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopMode {
    /// Terminate the engine and all active connections without waiting
    Immediate,
    /// Stop accepting, wait up to `timeout` for in-flight connections to
    /// finish, then force closure regardless
    Graceful {
        #[serde(with = "humantime_duration")]
        timeout: Duration,
    },
}

impl StopMode {
    /// Graceful stop with the given in-flight drain budget
    pub fn graceful(timeout: Duration) -> Self {
        StopMode::Graceful { timeout }
    }
}

impl Default for StopMode {
    fn default() -> Self {
        StopMode::Immediate
    }
}

/// Immutable server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to bind; 0 requests an ephemeral port assigned at bind time
    pub port: u16,
    /// Address to bind (defaults to `0.0.0.0`)
    pub bind_addr: Option<String>,
    /// Hostname advertised to clients (logs, `base_uri`); not used for binding
    pub advertised_host: Option<String>,
    /// Stop policy for `stop()`
    pub stop_mode: StopMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: None,
            advertised_host: None,
            stop_mode: StopMode::default(),
        }
    }
}

impl ServerConfig {
    /// Config for the given port with all other fields defaulted
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    /// Config bound to an ephemeral port (useful for tests and embedding)
    pub fn ephemeral() -> Self {
        Self::new(0)
    }

    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = Some(addr.into());
        self
    }

    pub fn with_advertised_host(mut self, host: impl Into<String>) -> Self {
        self.advertised_host = Some(host.into());
        self
    }

    pub fn with_stop_mode(mut self, stop_mode: StopMode) -> Self {
        self.stop_mode = stop_mode;
        self
    }

    /// Resolve the address this config binds to
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.bind_addr.as_deref().unwrap_or("0.0.0.0").parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Serde adapter for humantime-formatted durations ("2s", "1m 30s", ...)
mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(D::Error::custom)
    }
}
