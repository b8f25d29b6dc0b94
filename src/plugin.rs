//! Plugin lifecycle.
//!
//! A [`Plugin`] wraps a static [`PluginDescriptor`] and the concrete plugin's
//! [`PluginHooks`]. It moves through `Constructed → Loaded → Started ⇄ Stopped`:
//!
//! - construction captures default settings when the descriptor has a schema,
//! - `start` loads persisted settings, runs the changelog gate, asks for an
//!   update check and then calls the start hook,
//! - `stop` calls the stop hook. Nothing is persisted automatically.

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{PluginError, PluginResult};
use crate::gateway::{Gateways, ModalOptions};
use crate::plugin_api::PluginDescriptor;
use crate::schema::SettingsMap;
use crate::ui::{build_settings_panel, LiveSettings, SettingsPanel};

/// Logical key for the changelog gate's stored version.
pub const VERSION_INFO_KEY: &str = "currentVersionInfo";

/// Optional behaviour supplied by a concrete plugin.
///
/// Every method has a no-op default.
pub trait PluginHooks: Send {
    fn on_load(&mut self) {}

    /// Runs last in [`Plugin::start`], with the settings just loaded.
    fn on_start(&mut self, _settings: &SettingsMap) {}

    fn on_stop(&mut self) {}

    /// Whether the host may open a settings dialog for this plugin. Asked
    /// once, at construction.
    fn has_settings_panel(&self, has_schema: bool) -> bool {
        has_schema
    }
}

/// Hooks for a plugin that only needs the base behaviour.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl PluginHooks for NoHooks {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginState {
    Constructed,
    Loaded,
    Started,
    Stopped,
}

/// Last version a plugin ran as, and whether its changelog was shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: String,
    pub has_shown_changelog: bool,
}

impl VersionInfo {
    fn to_value(&self) -> Value {
        json!({
            "version": self.version,
            "hasShownChangelog": self.has_shown_changelog,
        })
    }
}

pub struct Plugin {
    descriptor: PluginDescriptor,
    name: String,
    state: PluginState,
    enabled: bool,
    default_settings: Option<SettingsMap>,
    settings: Option<LiveSettings>,
    settings_panel: bool,
    hooks: Box<dyn PluginHooks>,
    gateways: Gateways,
}

impl Plugin {
    pub fn new(
        descriptor: PluginDescriptor,
        hooks: impl PluginHooks + 'static,
        gateways: Gateways,
    ) -> PluginResult<Self> {
        descriptor.validate()?;

        let name = descriptor.info.name.replace(' ', "");
        let default_settings = descriptor
            .settings_schema
            .as_ref()
            .map(|schema| schema.default_settings());
        let settings = default_settings.as_ref().map(|_| LiveSettings::new());
        let settings_panel = hooks.has_settings_panel(descriptor.settings_schema.is_some());

        debug!("Constructed plugin {} v{}", name, descriptor.info.version);

        Ok(Self {
            descriptor,
            name,
            state: PluginState::Constructed,
            enabled: false,
            default_settings,
            settings,
            settings_panel,
            hooks: Box::new(hooks),
            gateways,
        })
    }

    /// Name used for storage keys and dialog titles (spaces removed).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.descriptor.info.description
    }

    pub fn version(&self) -> &str {
        &self.descriptor.info.version
    }

    pub fn author(&self) -> String {
        self.descriptor
            .info
            .authors
            .iter()
            .map(|author| author.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> PluginState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn default_settings(&self) -> Option<&SettingsMap> {
        self.default_settings.as_ref()
    }

    /// Current settings, or `None` for a plugin without a schema.
    pub fn settings(&self) -> Option<SettingsMap> {
        self.settings.as_ref().map(LiveSettings::snapshot)
    }

    pub fn live_settings(&self) -> Option<&LiveSettings> {
        self.settings.as_ref()
    }

    pub fn load(&mut self) {
        if self.state != PluginState::Constructed {
            debug!("{} is already loaded", self.name);
            return;
        }
        self.hooks.on_load();
        self.state = PluginState::Loaded;
    }

    pub fn start(&mut self) {
        if self.state == PluginState::Started {
            return;
        }

        if let Some(live) = &self.settings {
            live.replace(self.load_settings(None));
        }

        self.run_changelog_gate();

        let info = &self.descriptor.info;
        self.gateways
            .updates
            .check_for_update(&self.name, &info.version, info.update_source.as_deref());

        self.enabled = true;
        self.state = PluginState::Started;

        let settings = self.settings().unwrap_or_default();
        self.hooks.on_start(&settings);

        info!("Started plugin: {} v{}", self.name, self.version());
    }

    pub fn stop(&mut self) {
        if self.state != PluginState::Started {
            return;
        }

        self.enabled = false;
        self.state = PluginState::Stopped;
        self.hooks.on_stop();

        info!("Stopped plugin: {}", self.name);
    }

    fn run_changelog_gate(&self) {
        let persistence = &self.gateways.persistence;
        let current = VersionInfo {
            version: self.version().to_string(),
            has_shown_changelog: false,
        };

        let loaded = persistence.load_data(&self.name, VERSION_INFO_KEY, current.to_value());
        let stored: VersionInfo = match loaded {
            Ok(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!("Ignoring unreadable version info for {}: {}", self.name, e);
                current.clone()
            }),
            Err(e) => {
                warn!("Failed to load version info for {}: {:#}", self.name, e);
                current.clone()
            }
        };

        if stored.version == current.version && stored.has_shown_changelog {
            return;
        }

        self.show_changelog(None);

        let shown = VersionInfo {
            has_shown_changelog: true,
            ..current
        };
        if let Err(e) = persistence.save_data(&self.name, VERSION_INFO_KEY, shown.to_value()) {
            error!("Failed to save version info for {}: {:#}", self.name, e);
        }
    }

    /// Ask the host to show this version's changelog, if there is one.
    pub fn show_changelog(&self, footer: Option<&str>) {
        let Some(changelog) = &self.descriptor.changelog else {
            return;
        };
        self.gateways.modals.show_changelog_modal(
            &format!("{} Changelog", self.name),
            self.version(),
            changelog,
            footer,
        );
    }

    /// Build the panel and ask the host to show it in a dialog.
    ///
    /// Returns the panel so the host can route widget changes back to it.
    pub fn show_settings_modal(&self) -> Option<SettingsPanel> {
        if !self.settings_panel {
            return None;
        }

        let panel = match self.build_settings_panel() {
            Ok(panel) => panel,
            Err(e) => {
                warn!("Cannot show settings for {}: {}", self.name, e);
                return None;
            }
        };

        let content = self.gateways.renderer.render(&panel);
        self.gateways.modals.show_modal(
            &format!("{} Settings", self.name),
            content,
            ModalOptions::settings(),
        );
        Some(panel)
    }

    /// Reset the live settings to the schema's values and build its panel.
    pub fn build_settings_panel(&self) -> PluginResult<SettingsPanel> {
        match (&self.descriptor.settings_schema, &self.settings) {
            (Some(schema), Some(live)) => Ok(build_settings_panel(
                &self.name,
                schema,
                live,
                self.gateways.persistence.clone(),
            )),
            _ => Err(PluginError::NoSettingsSchema(self.name.clone())),
        }
    }

    /// Persist the live settings, or `settings` for a plugin without a schema.
    pub fn save_settings(&self, settings: Option<&SettingsMap>) {
        let snapshot = match (&self.settings, settings) {
            (Some(live), _) => live.snapshot(),
            (None, Some(settings)) => settings.clone(),
            (None, None) => {
                debug!("{} has no settings to save", self.name);
                return;
            }
        };

        if let Err(e) = self
            .gateways
            .persistence
            .save_settings(&self.name, &snapshot)
        {
            error!("Failed to save settings for {}: {:#}", self.name, e);
        }
    }

    /// Persisted settings over the schema defaults, or over `defaults` for a
    /// plugin without a schema.
    pub fn load_settings(&self, defaults: Option<&SettingsMap>) -> SettingsMap {
        let base = self
            .default_settings
            .as_ref()
            .or(defaults)
            .cloned()
            .unwrap_or_default();

        match self.gateways.persistence.load_settings(&self.name, &base) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings for {}, using defaults: {:#}", self.name, e);
                base
            }
        }
    }
}
