//! Runtime config: the server-authoritative defaults handed to clients.
//!
//! The server renders it once per page load as a script assigning a global
//! object (`window._CONFIG = {...};`). Clients parse it back with
//! [`RuntimeConfig::from_script`]. Every field is optional on the way in so a
//! partial or older payload still yields a usable layer.

use serde::{Deserialize, Serialize};

/// Global the config script assigns.
pub const CONFIG_GLOBAL: &str = "window._CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wisp_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_search: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_transport: Option<String>,

    pub transports: Vec<String>,
}

impl RuntimeConfig {
    /// Render as a self-contained script.
    pub fn to_script(&self) -> Result<String, serde_json::Error> {
        Ok(format!("{} = {};", CONFIG_GLOBAL, serde_json::to_string(self)?))
    }

    /// Parse a script produced by [`RuntimeConfig::to_script`].
    ///
    /// Returns `None` when the script does not assign the config global or the
    /// assigned value is not a JSON object.
    pub fn from_script(script: &str) -> Option<Self> {
        let rest = script.trim().strip_prefix(CONFIG_GLOBAL)?;
        let rest = rest.trim_start().strip_prefix('=')?;
        let json = rest.trim().trim_end_matches(';').trim_end();
        serde_json::from_str(json).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_assigns_global() {
        let config = RuntimeConfig {
            wisp_path: Some("/wisp/".into()),
            default_search: Some("https://duckduckgo.com/?q=%s".into()),
            default_transport: Some("/epoxy/index.mjs".into()),
            transports: vec!["/epoxy/index.mjs".into()],
        };

        let script = config.to_script().unwrap();
        assert!(script.starts_with("window._CONFIG = {"));
        assert!(script.ends_with("};"));
        assert!(script.contains("\"wispPath\":\"/wisp/\""));
        assert_eq!(RuntimeConfig::from_script(&script), Some(config));
    }

    #[test]
    fn partial_script_fills_defaults() {
        let parsed = RuntimeConfig::from_script("window._CONFIG = {\"wispPath\":\"/w/\"};").unwrap();
        assert_eq!(parsed.wisp_path.as_deref(), Some("/w/"));
        assert!(parsed.transports.is_empty());
        assert!(parsed.default_search.is_none());
    }

    #[test]
    fn foreign_script_is_rejected() {
        assert!(RuntimeConfig::from_script("console.log(1);").is_none());
        assert!(RuntimeConfig::from_script("window._CONFIG = [1, 2];").is_none());
        assert!(RuntimeConfig::from_script("").is_none());
    }
}
