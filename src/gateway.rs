//! Collaborators a plugin talks to but does not implement.
//!
//! Persistence, modal display, update checks and panel rendering are owned by
//! the host. The core only calls into them and never waits on or reacts to
//! the update check.

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

use crate::plugin_api::Changelog;
use crate::schema::SettingsMap;
use crate::store::merge_defaults;
use crate::ui::SettingsPanel;

/// Logical key under which settings are stored.
pub const SETTINGS_KEY: &str = "settings";

/// Key/value storage scoped by plugin name.
pub trait PersistenceGateway: Send + Sync {
    fn load_data(&self, plugin: &str, key: &str, default: Value) -> Result<Value>;

    fn save_data(&self, plugin: &str, key: &str, value: Value) -> Result<()>;

    /// Stored settings overlaid on `defaults`. Keys never persisted keep their
    /// default value.
    fn load_settings(&self, plugin: &str, defaults: &SettingsMap) -> Result<SettingsMap> {
        let stored = self.load_data(plugin, SETTINGS_KEY, Value::Object(SettingsMap::new()))?;
        Ok(match stored {
            Value::Object(stored) => merge_defaults(defaults, &stored),
            _ => defaults.clone(),
        })
    }

    fn save_settings(&self, plugin: &str, settings: &SettingsMap) -> Result<()> {
        self.save_data(plugin, SETTINGS_KEY, Value::Object(settings.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalOptions {
    pub cancel_text: String,
    pub confirm_text: String,
    pub size: ModalSize,
}

impl ModalOptions {
    /// Options used for a plugin's settings dialog.
    pub fn settings() -> Self {
        Self {
            cancel_text: String::new(),
            confirm_text: "Done".to_string(),
            size: ModalSize::Medium,
        }
    }
}

/// A settings panel converted into whatever the host displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedElement(pub String);

pub trait ModalGateway: Send + Sync {
    fn show_modal(&self, title: &str, content: RenderedElement, options: ModalOptions);

    fn show_changelog_modal(
        &self,
        title: &str,
        version: &str,
        changelog: &Changelog,
        footer: Option<&str>,
    );
}

pub trait UpdateGateway: Send + Sync {
    fn check_for_update(&self, plugin: &str, version: &str, update_source: Option<&str>);
}

pub trait PanelRenderer: Send + Sync {
    fn render(&self, panel: &SettingsPanel) -> RenderedElement;
}

/// Everything a [`crate::plugin::Plugin`] needs from its host.
#[derive(Clone)]
pub struct Gateways {
    pub persistence: Arc<dyn PersistenceGateway>,
    pub modals: Arc<dyn ModalGateway>,
    pub updates: Arc<dyn UpdateGateway>,
    pub renderer: Arc<dyn PanelRenderer>,
}
