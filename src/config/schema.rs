//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Content type used for override payloads that do not name one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// The single upstream every non-overridden request goes to.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Canned responses, matched in the order listed.
    pub overrides: Vec<OverrideConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8443").
    pub bind_address: String,

    /// TLS certificate and key presented to clients.
    pub tls: TlsConfig,
}

impl ListenerConfig {
    /// The address to bind. A bare `:port` means every interface.
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        match self.bind_address.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}").parse(),
            None => self.bind_address.parse(),
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8443".to_string(),
            tls: TlsConfig::default(),
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: PathBuf::from("server.crt"),
            key_path: PathBuf::from("server.key"),
        }
    }
}

/// Upstream target configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Host header presented to the upstream.
    pub host: String,

    /// Network address actually dialed ("ip" or "ip:port", port defaults to 443).
    pub address: String,

    /// Accept any certificate the upstream presents.
    ///
    /// The proxy usually dials a bare IP whose certificate is issued for
    /// `host`, so this is on unless turned off explicitly.
    pub skip_certificate_verification: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: "www.linkedin.com".to_string(),
            address: "13.107.42.14".to_string(),
            skip_certificate_verification: true,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time to wait for upstream response headers, in seconds.
    pub upstream_secs: u64,

    /// Overall inbound request timeout in seconds.
    pub request_secs: u64,

    /// How long in-flight requests may run after shutdown starts.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            upstream_secs: 30,
            request_secs: 60,
            shutdown_grace_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// A canned response and the request prefix it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OverrideConfig {
    /// URL-like pattern; only its path and query take part in matching.
    pub path: String,

    /// Status code to answer with.
    #[serde(default = "default_status")]
    pub status: u16,

    /// File holding the response body, read once at startup.
    pub body_file: PathBuf,

    /// Content-Type of the body (default: `application/json`).
    #[serde(default)]
    pub content_type: Option<String>,

    /// Additional response headers.
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
}

fn default_status() -> u16 {
    200
}

impl OverrideConfig {
    /// Override answering `200` with the contents of `body_file`.
    pub fn new(path: impl Into<String>, body_file: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            status: default_status(),
            body_file: body_file.into(),
            content_type: None,
            headers: BTreeMap::new(),
        }
    }

    /// Content type the payload is served with.
    pub fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// Parses the command line form `PATTERN=BODY_FILE`.
///
/// Patterns routinely carry `=` in their query, so the split happens at the
/// last `=`.
impl FromStr for OverrideConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('=') {
            Some((path, file)) if !path.is_empty() && !file.is_empty() => {
                Ok(Self::new(path, file))
            }
            _ => Err(format!("expected PATTERN=BODY_FILE, got {s:?}")),
        }
    }
}
