//! Configuration loading: optional TOML file, then environment overrides.
//!
//! The environment is read exactly once at boot. Every variable has a
//! fallback: an unset variable keeps the file/default value, an unparseable
//! one is logged and ignored.

use std::fs;
use std::path::Path;

use crate::config::schema::{GatewayConfig, WispLogLevel};
use crate::config::validation::{validate_config, ValidationError};
use crate::routing::normalize_path;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_FILE_VAR: &str = "WISP_GATEWAY_CONFIG";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: GatewayConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the boot configuration from the process environment.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    let base = match std::env::var(CONFIG_FILE_VAR) {
        Ok(path) if !path.trim().is_empty() => load_config(Path::new(path.trim()))?,
        _ => GatewayConfig::default(),
    };

    let config = apply_env(base, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Layer environment values over `config`. `lookup` returns a variable's value.
pub fn apply_env<F>(mut config: GatewayConfig, lookup: F) -> GatewayConfig
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(path) = get("WISP_PATH") {
        config.wisp.path = normalize_path(path.trim());
    } else {
        config.wisp.path = normalize_path(&config.wisp.path);
    }
    if let Some(search) = get("DEFAULT_SEARCH_TEMPLATE") {
        config.client.default_search = search;
    }
    if let Some(transport) = get("DEFAULT_TRANSPORT") {
        config.client.default_transport = transport.trim().to_string();
    }
    if let Some(transports) = get("WISP_TRANSPORTS") {
        let list = split_list(&transports);
        if list.is_empty() {
            tracing::warn!(value = %transports, "WISP_TRANSPORTS lists no transports, keeping defaults");
        } else {
            config.client.transports = list;
        }
    }
    if let Some(flag) = get("WISP_ALLOW_UDP_STREAMS") {
        config.wisp.allow_udp_streams = parse_env_bool(&flag);
    }
    if let Some(blacklist) = get("WISP_HOSTNAME_BLACKLIST") {
        config.wisp.hostname_blacklist = split_list(&blacklist);
    }
    if let Some(dns) = get("WISP_DNS") {
        config.wisp.dns_servers = split_list(&dns);
    }
    if let Some(level) = get("WISP_LOG_LEVEL") {
        config.wisp.log_level = WispLogLevel::parse(&level);
    }
    if let Some(port) = get("PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => config.listener.port = port,
            Err(e) => {
                tracing::warn!(value = %port, error = %e, fallback = config.listener.port, "Ignoring unparseable PORT");
            }
        }
    }
    if let Some(dir) = get("PUBLIC_DIR") {
        config.assets.public_dir = dir;
    }
    if let Some(addr) = get("METRICS_ADDRESS") {
        config.observability.metrics_address = Some(addr.trim().to_string());
    }

    config
}

/// `1`, `true`, `yes` and `on` (any case) are true; everything else is false.
pub fn parse_env_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}
