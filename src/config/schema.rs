//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits so an optional TOML file can provide them;
//! environment variables are layered on top by the loader.

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::config::runtime::RuntimeConfig;
use crate::routing::normalize_path;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind host, port, connection limit).
    pub listener: ListenerConfig,

    /// Wisp layer options (upgrade path, DNS, blacklist).
    pub wisp: WispConfig,

    /// Defaults handed to clients through `/config.js`.
    pub client: ClientDefaults,

    /// Static asset serving.
    pub assets: AssetsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl GatewayConfig {
    /// The runtime config every client receives at page load.
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            wisp_path: Some(normalize_path(&self.wisp.path)),
            default_search: Some(self.client.default_search.clone()),
            default_transport: Some(self.client.default_transport.clone()),
            transports: self.client.transports.clone(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port.
    pub port: u16,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl ListenerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: defaults::BIND_HOST.to_string(),
            port: defaults::PORT,
            max_connections: 10_000,
        }
    }
}

/// Wisp layer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WispConfig {
    /// Path that upgrade requests must target. Always normalized on load.
    pub path: String,

    /// Whether clients may open UDP streams.
    pub allow_udp_streams: bool,

    /// Hostnames the Wisp layer refuses, matched literally.
    pub hostname_blacklist: Vec<String>,

    /// DNS servers used to resolve stream targets.
    pub dns_servers: Vec<String>,

    /// Verbosity of the Wisp layer's own logging.
    pub log_level: WispLogLevel,
}

impl Default for WispConfig {
    fn default() -> Self {
        Self {
            path: defaults::WISP_PATH.to_string(),
            allow_udp_streams: false,
            hostname_blacklist: defaults::hostname_blacklist(),
            dns_servers: defaults::dns_servers(),
            log_level: WispLogLevel::None,
        }
    }
}

/// Log verbosity of the Wisp layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WispLogLevel {
    Debug,
    Info,
    Warn,
    Error,
    #[default]
    None,
}

impl WispLogLevel {
    /// Parse a level name. Anything unrecognized silences the layer.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" => Self::Warn,
            "error" => Self::Error,
            _ => Self::None,
        }
    }

    /// `EnvFilter` level for the Wisp layer's log target.
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::None => "off",
        }
    }
}

/// Defaults handed to clients.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientDefaults {
    /// Search template with a `%s` placeholder.
    pub default_search: String,

    /// Transport selected for new clients.
    pub default_transport: String,

    /// Transports offered to clients, in display order.
    pub transports: Vec<String>,
}

impl Default for ClientDefaults {
    fn default() -> Self {
        Self {
            default_search: defaults::SEARCH_TEMPLATE.to_string(),
            default_transport: defaults::TRANSPORT.to_string(),
            transports: defaults::transports(),
        }
    }
}

/// Static asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory served for ordinary GET requests.
    pub public_dir: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            public_dir: defaults::PUBLIC_DIR.to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Ordinary request timeout in seconds.
    pub request_secs: u64,

    /// How long shutdown waits for open connections to drain.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Prometheus exporter bind address; disabled when unset.
    pub metrics_address: Option<String>,
}
