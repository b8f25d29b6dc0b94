use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "plugin-base";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub ui: UiConfig,
    #[serde(default)]
    pub updates: UpdateConfig,
    #[serde(default)]
    pub plugins: HashMap<String, PluginConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one `<plugin>.config.json` per plugin.
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub console_enabled: bool,
    #[serde(default = "default_max_entries")]
    pub console_max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    pub check_for_updates: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_max_entries() -> usize {
    1000
}

fn default_enabled() -> bool {
    true
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            check_for_updates: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("plugins");

        Self {
            storage: StorageConfig { data_dir },
            ui: UiConfig {
                console_enabled: true,
                console_max_entries: default_max_entries(),
            },
            updates: UpdateConfig::default(),
            plugins: HashMap::new(),
        }
    }
}

impl Config {
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Failed to get config directory"))?
            .join(APP_DIR);

        fs::create_dir_all(&config_dir)?;
        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn load_or_default() -> Result<Self> {
        match Self::load() {
            Ok(config) => Ok(config),
            Err(_) => {
                let config = Self::default();
                config.save()?;
                Ok(config)
            }
        }
    }

    /// Plugins start unless they were switched off.
    pub fn is_plugin_enabled(&self, plugin_name: &str) -> bool {
        self.plugins
            .get(plugin_name)
            .map(|p| p.enabled)
            .unwrap_or(true)
    }

    pub fn set_plugin_enabled(&mut self, plugin_name: &str, enabled: bool) {
        self.plugins
            .entry(plugin_name.to_string())
            .or_insert_with(|| PluginConfig { enabled: true })
            .enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugins_default_to_enabled() {
        let mut config = Config::default();
        assert!(config.is_plugin_enabled("Anything"));

        config.set_plugin_enabled("Quiet", false);
        assert!(!config.is_plugin_enabled("Quiet"));
        assert!(config.is_plugin_enabled("Anything"));
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.storage.data_dir = dir.path().join("data");
        config.updates.check_for_updates = false;
        config.set_plugin_enabled("Quiet", false);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.storage.data_dir, dir.path().join("data"));
        assert!(!loaded.updates.check_for_updates);
        assert!(!loaded.is_plugin_enabled("Quiet"));
    }

    #[test]
    fn test_config_deserialization_fills_defaults() {
        let toml_src = r#"
[storage]
data_dir = "/tmp/plugin-data"

[ui]
console_enabled = false

[plugins.Quiet]
"#;
        let config: Config = toml::from_str(toml_src).unwrap();
        assert!(!config.ui.console_enabled);
        assert_eq!(config.ui.console_max_entries, 1000);
        assert!(config.updates.check_for_updates);
        assert!(config.is_plugin_enabled("Quiet"));
    }
}
