//! UI capabilities the client drives.
//!
//! Every element is optional: a page without a settings panel still proxies,
//! it just has nothing to hydrate.

use std::sync::{Arc, Mutex, PoisonError};

use crate::client::probe::ConnectivityResult;
use crate::client::settings::{describe_transport, SettingKey, Settings};

/// A single page element.
pub trait Control: Send + Sync {
    fn value(&self) -> String;
    fn set_value(&self, value: &str);
    fn set_enabled(&self, enabled: bool);
    fn set_visible(&self, visible: bool);
    fn is_visible(&self) -> bool;

    /// Replace the choices of a select element as `(value, label)` pairs.
    fn set_options(&self, _options: &[(String, String)]) {}

    /// Replace the element's state class.
    fn set_class(&self, _class: &str) {}
}

/// In-process control that records what was done to it.
#[derive(Debug)]
pub struct MemoryControl {
    state: Mutex<MemoryControlState>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryControlState {
    pub value: String,
    pub enabled: bool,
    pub visible: bool,
    pub options: Vec<(String, String)>,
    pub class: String,
}

impl MemoryControl {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryControlState {
                enabled: true,
                visible: true,
                ..Default::default()
            }),
        }
    }

    pub fn hidden() -> Self {
        let control = Self::new();
        control.set_visible(false);
        control
    }

    pub fn snapshot(&self) -> MemoryControlState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryControlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryControl {
    fn default() -> Self {
        Self::new()
    }
}

impl Control for MemoryControl {
    fn value(&self) -> String {
        self.lock().value.clone()
    }

    fn set_value(&self, value: &str) {
        self.lock().value = value.to_string();
    }

    fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
    }

    fn set_visible(&self, visible: bool) {
        self.lock().visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.lock().visible
    }

    fn set_options(&self, options: &[(String, String)]) {
        self.lock().options = options.to_vec();
    }

    fn set_class(&self, class: &str) {
        self.lock().class = class.to_string();
    }
}

pub type ControlRef = Option<Arc<dyn Control>>;

/// The page's elements.
#[derive(Clone, Default)]
pub struct Controls {
    pub address: ControlRef,
    pub search_engine: ControlRef,
    pub error: ControlRef,
    pub error_code: ControlRef,
    pub settings_panel: ControlRef,
    pub wisp_path: ControlRef,
    pub search_template: ControlRef,
    pub transport: ControlRef,
    pub connection_test: ControlRef,
    pub connection_status: ControlRef,
    pub connection_details: ControlRef,
}

impl Controls {
    /// Mirror `settings` into the inputs.
    pub fn hydrate(&self, settings: &Settings) {
        set(&self.wisp_path, &settings.wisp_path);
        set(&self.search_template, &settings.search_template);
        set(&self.transport, &settings.transport);
        set(&self.search_engine, &settings.search_template);
    }

    /// Fill the transport select and keep the current choice selected.
    pub fn hydrate_transports(&self, transports: &[String], selected: &str) {
        if let Some(select) = &self.transport {
            let options: Vec<(String, String)> = transports
                .iter()
                .map(|t| (t.clone(), describe_transport(t)))
                .collect();
            select.set_options(&options);
            select.set_value(selected);
        }
    }

    /// Input bound to a settings field.
    pub fn setting(&self, key: SettingKey) -> &ControlRef {
        match key {
            SettingKey::WispPath => &self.wisp_path,
            SettingKey::SearchTemplate => &self.search_template,
            SettingKey::Transport => &self.transport,
        }
    }

    pub fn show_settings(&self) {
        if let Some(panel) = &self.settings_panel {
            panel.set_visible(true);
        }
    }

    pub fn toggle_settings(&self) {
        if let Some(panel) = &self.settings_panel {
            panel.set_visible(!panel.is_visible());
        }
    }

    /// Render a probe result. A page without the status elements shows nothing.
    pub fn render_status(&self, result: &ConnectivityResult) {
        let (Some(status), Some(details)) = (&self.connection_status, &self.connection_details)
        else {
            return;
        };
        status.set_class(&format!("status-{}", result.state.as_str()));
        status.set_value(result.state.label());
        details.set_value(&result.message);
    }

    pub fn show_error(&self, message: &str, detail: &str) {
        set(&self.error, message);
        set(&self.error_code, detail);
        self.show_settings();
    }

    pub fn clear_error(&self) {
        set(&self.error, "");
        set(&self.error_code, "");
    }

    pub fn address(&self) -> String {
        self.address.as_ref().map(|a| a.value()).unwrap_or_default()
    }
}

/// User actions routed through the bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleSettings,
    WispPathChanged,
    SearchTemplateChanged,
    TransportChanged,
    TestConnection,
    Submit,
}

impl Command {
    /// Settings field a change command edits.
    pub fn setting(&self) -> Option<SettingKey> {
        match self {
            Self::WispPathChanged => Some(SettingKey::WispPath),
            Self::SearchTemplateChanged => Some(SettingKey::SearchTemplate),
            Self::TransportChanged => Some(SettingKey::Transport),
            _ => None,
        }
    }
}

fn set(control: &ControlRef, value: &str) {
    if let Some(control) = control {
        control.set_value(value);
    }
}
