//! Three-tier settings: built-in defaults, runtime config, persisted overrides.
//!
//! # Data Flow
//! ```text
//! built-in defaults  (config::defaults)
//!     ← overridden by RuntimeConfig (fetched once at boot)
//!     ← overridden by persisted JSON (storage key `scramjet-settings`)
//!     = effective Settings (watch channel)
//!
//! update(key, value)
//!     → mutate effective settings
//!     → persist the whole object as JSON
//!     → notify subscribers, schedule a debounced probe
//! ```

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::client::error::ClientError;
use crate::client::schedule::ProbeScheduler;
use crate::client::storage::SettingsStorage;
use crate::config::{defaults, RuntimeConfig};
use crate::routing::normalize_path;

/// Storage key holding the persisted settings.
pub const STORAGE_KEY: &str = "scramjet-settings";

/// Effective client settings. `wisp_path` always starts and ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub wisp_path: String,
    pub search_template: String,
    pub transport: String,
}

impl Settings {
    /// Built-in constants, the lowest layer.
    pub fn builtin() -> Self {
        Self {
            wisp_path: defaults::WISP_PATH.to_string(),
            search_template: defaults::SEARCH_TEMPLATE.to_string(),
            transport: defaults::TRANSPORT.to_string(),
        }
    }

    /// Built-in constants overridden by the runtime config.
    pub fn from_runtime(runtime: &RuntimeConfig) -> Self {
        let builtin = Self::builtin();
        let transport = non_empty(runtime.default_transport.as_deref())
            .or_else(|| available_transports(runtime).into_iter().next())
            .unwrap_or(builtin.transport);

        Self {
            wisp_path: normalize_path(
                non_empty(runtime.wisp_path.as_deref())
                    .as_deref()
                    .unwrap_or(defaults::WISP_PATH),
            ),
            search_template: non_empty(runtime.default_search.as_deref())
                .unwrap_or(builtin.search_template),
            transport,
        }
    }

    /// Apply persisted overrides field by field.
    pub fn with_overrides(mut self, overrides: &SettingsOverrides) -> Self {
        if let Some(path) = &overrides.wisp_path {
            self.wisp_path = normalize_path(path);
        }
        if let Some(template) = &overrides.search_template {
            self.search_template = template.clone();
        }
        if let Some(transport) = &overrides.transport {
            self.transport = transport.clone();
        }
        self
    }

    pub fn get(&self, key: SettingKey) -> &str {
        match key {
            SettingKey::WispPath => &self.wisp_path,
            SettingKey::SearchTemplate => &self.search_template,
            SettingKey::Transport => &self.transport,
        }
    }
}

/// Transports the runtime config offers, or the built-in list when it offers none.
pub fn available_transports(runtime: &RuntimeConfig) -> Vec<String> {
    if runtime.transports.is_empty() {
        defaults::transports()
    } else {
        runtime.transports.clone()
    }
}

/// Human label for a transport identifier.
pub fn describe_transport(transport: &str) -> String {
    if transport.contains("epoxy") {
        "Epoxy".to_string()
    } else if transport.contains("bare") {
        "Bare-mux".to_string()
    } else {
        transport.to_string()
    }
}

/// A partial settings layer. Absent or empty fields do not override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub wisp_path: Option<String>,
    pub search_template: Option<String>,
    pub transport: Option<String>,
}

impl SettingsOverrides {
    /// Parse a persisted blob. Empty or non-string fields are skipped, so
    /// they never override the lower layers.
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| ClientError::SettingsParseFailure(e.to_string()))?;
        let object = value
            .as_object()
            .ok_or_else(|| ClientError::SettingsParseFailure("expected a JSON object".into()))?;

        let field = |name: &str| {
            object
                .get(name)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        Ok(Self {
            wisp_path: field("wispPath"),
            search_template: field("searchTemplate"),
            transport: field("transport"),
        })
    }

    /// Read the persisted layer. Missing, unreadable or corrupt storage is empty.
    pub fn load(storage: &dyn SettingsStorage) -> Self {
        let raw = match storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Settings storage unreadable, ignoring overrides");
                return Self::default();
            }
        };

        Self::parse(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding persisted settings");
            Self::default()
        })
    }
}

/// A settings field the UI can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    WispPath,
    SearchTemplate,
    Transport,
}

impl SettingKey {
    pub const ALL: [SettingKey; 3] = [Self::WispPath, Self::SearchTemplate, Self::Transport];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WispPath => "wisp-path",
            Self::SearchTemplate => "search-template",
            Self::Transport => "transport",
        }
    }
}

impl FromStr for SettingKey {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wisp-path" | "wispPath" => Ok(Self::WispPath),
            "search-template" | "searchTemplate" => Ok(Self::SearchTemplate),
            "transport" => Ok(Self::Transport),
            other => Err(ClientError::UnknownSetting(other.to_string())),
        }
    }
}

/// Owns the effective settings for the page's lifetime.
pub struct SettingsStore {
    storage: Arc<dyn SettingsStorage>,
    base: Settings,
    transports: Vec<String>,
    current: watch::Sender<Settings>,
    scheduler: Option<ProbeScheduler>,
}

impl SettingsStore {
    /// Merge defaults, `runtime` and the persisted overrides.
    pub fn load(runtime: &RuntimeConfig, storage: Arc<dyn SettingsStorage>) -> Self {
        let base = Settings::from_runtime(runtime);
        let effective = base.clone().with_overrides(&SettingsOverrides::load(storage.as_ref()));
        tracing::debug!(
            wisp_path = %effective.wisp_path,
            transport = %effective.transport,
            "Settings loaded"
        );

        let (current, _) = watch::channel(effective);
        Self {
            storage,
            base,
            transports: available_transports(runtime),
            current,
            scheduler: None,
        }
    }

    /// Schedule a debounced probe after every update.
    pub fn with_probe_scheduler(mut self, scheduler: ProbeScheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn settings(&self) -> Settings {
        self.current.borrow().clone()
    }

    /// Receiver notified after every update.
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.current.subscribe()
    }

    pub fn transports(&self) -> &[String] {
        &self.transports
    }

    /// Cancel a debounced probe that has not started yet.
    pub fn cancel_pending_probe(&self) -> bool {
        self.scheduler
            .as_ref()
            .map(ProbeScheduler::cancel_pending)
            .unwrap_or(false)
    }

    /// Change one field, persist the whole object and notify dependents.
    ///
    /// A persistence failure comes back as `StorageWriteFailed`; the in-memory
    /// change and notifications have happened regardless.
    pub fn update(&self, key: SettingKey, value: &str) -> Result<Settings, ClientError> {
        self.current.send_modify(|settings| match key {
            SettingKey::WispPath => settings.wisp_path = normalize_path(value.trim()),
            SettingKey::SearchTemplate => settings.search_template = value.to_string(),
            SettingKey::Transport => settings.transport = value.to_string(),
        });
        let settings = self.settings();

        if let Some(scheduler) = &self.scheduler {
            scheduler.schedule(settings.clone());
        }

        self.persist(&settings)?;
        Ok(settings)
    }

    /// Forget persisted overrides and fall back to the runtime layer.
    pub fn reset(&self) -> Result<Settings, ClientError> {
        let base = self.base.clone();
        self.current.send_replace(base.clone());
        self.storage
            .remove(STORAGE_KEY)
            .map_err(|e| ClientError::StorageWriteFailed(e.to_string()))?;
        Ok(base)
    }

    fn persist(&self, settings: &Settings) -> Result<(), ClientError> {
        let json = serde_json::to_string(settings)
            .map_err(|e| ClientError::StorageWriteFailed(e.to_string()))?;
        self.storage.set(STORAGE_KEY, &json).map_err(|e| {
            tracing::warn!(error = %e, "Failed to persist settings");
            ClientError::StorageWriteFailed(e.to_string())
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(String::from)
}
