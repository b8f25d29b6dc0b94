pub mod config;
pub mod console;
pub mod error;
pub mod gateway;
pub mod plugin;
pub mod plugin_api;
pub mod schema;
pub mod store;
pub mod ui;
pub mod updater;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

pub use config::Config;
pub use console::ConsoleLog;
pub use error::{PluginError, PluginResult, SchemaError};
pub use gateway::Gateways;
pub use plugin::{NoHooks, Plugin, PluginHooks, PluginState};
pub use plugin_api::{PluginDescriptor, PluginInfo};
pub use store::{FileStore, MemoryStore};
pub use updater::UpdateQueue;

/// Host-side state shared by every plugin the host runs.
pub struct HostState {
    pub config: Arc<RwLock<Config>>,
    pub console: Arc<RwLock<ConsoleLog>>,
    pub store: Arc<FileStore>,
    pub updates: Arc<UpdateQueue>,
}

impl HostState {
    pub fn new() -> Result<Self> {
        Self::with_config(Config::load_or_default()?)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let store = FileStore::new(config.storage.data_dir.clone())?;

        let mut console = ConsoleLog::with_max_entries(config.ui.console_max_entries);
        console.set_enabled(config.ui.console_enabled);

        Ok(Self {
            store: Arc::new(store),
            updates: Arc::new(UpdateQueue::new(config.updates.check_for_updates)),
            console: Arc::new(RwLock::new(console)),
            config: Arc::new(RwLock::new(config)),
        })
    }

    pub fn gateways(&self) -> Gateways {
        Gateways {
            persistence: self.store.clone(),
            modals: self.console.clone(),
            updates: self.updates.clone(),
            renderer: Arc::new(ui::TextRenderer),
        }
    }

    /// Read a descriptor file and construct its plugin against this host.
    pub fn load_plugin(&self, path: &Path) -> Result<Plugin> {
        let descriptor = PluginDescriptor::from_file(path)
            .with_context(|| format!("Failed to read descriptor {}", path.display()))?;

        let mut plugin = Plugin::new(descriptor, NoHooks, self.gateways())?;
        plugin.load();
        Ok(plugin)
    }

    /// Start the plugins enabled in config, show their settings, then stop them all.
    ///
    /// A settings panel is only saved when one of its widgets changed a value.
    pub fn run_session(&self, plugins: &mut [Plugin]) {
        for plugin in plugins.iter_mut() {
            if self.config.read().is_plugin_enabled(plugin.name()) {
                plugin.start();
            } else {
                self.console
                    .write()
                    .log_info(&format!("Plugin '{}' is disabled, skipping", plugin.name()));
            }
        }

        for plugin in plugins.iter().filter(|p| p.is_enabled()) {
            if let Some(panel) = plugin.show_settings_modal() {
                if panel.is_edited() {
                    panel.save();
                }
            }
        }

        for plugin in plugins.iter_mut() {
            plugin.stop();
        }
    }
}
