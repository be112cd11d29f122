//! Health payload served at `/healthz` and read by the connectivity probe.

use serde::{Deserialize, Serialize};

use crate::config::{GatewayConfig, RuntimeConfig};
use crate::wisp::WispOptions;

pub const STATUS_OK: &str = "ok";

/// Live proxy configuration for client self-diagnosis.
///
/// Optional fields stay optional on the way in so the probe tolerates a
/// server that reports less.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthStatus {
    pub status: String,

    #[serde(flatten)]
    pub runtime: RuntimeConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_servers: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_udp_streams: Option<bool>,

    pub hostname_blacklist: Vec<String>,
}

impl HealthStatus {
    /// Snapshot of the server's current wisp-layer configuration.
    pub fn current(config: &GatewayConfig, options: &WispOptions) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            runtime: config.runtime_config(),
            dns_servers: Some(options.dns_servers.clone()),
            allow_udp_streams: Some(options.allow_udp_streams),
            hostname_blacklist: options
                .hostname_blacklist
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Upgrade path the server reports, if any.
    pub fn wisp_path(&self) -> Option<&str> {
        self.runtime.wisp_path.as_deref().filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_flat_camel_case() {
        let config = GatewayConfig::default();
        let status = HealthStatus::current(&config, &WispOptions::from(&config.wisp));

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "ok",
                "wispPath": "/wisp/",
                "defaultSearch": "https://www.google.com/search?q=%s",
                "defaultTransport": "/epoxy/index.mjs",
                "transports": ["/epoxy/index.mjs", "/baremux/worker.js"],
                "dnsServers": ["1.1.1.3", "1.0.0.3"],
                "allowUdpStreams": false,
                "hostnameBlacklist": ["/example\\.com/"],
            })
        );
    }

    #[test]
    fn minimal_payload_deserializes() {
        let status: HealthStatus =
            serde_json::from_str(r#"{"status":"ok","wispPath":"/wisp/","dnsServers":["1.1.1.3"]}"#)
                .unwrap();

        assert_eq!(status.wisp_path(), Some("/wisp/"));
        assert_eq!(status.dns_servers, Some(vec!["1.1.1.3".to_string()]));
        assert!(status.allow_udp_streams.is_none());
    }
}
