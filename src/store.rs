use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::gateway::PersistenceGateway;
use crate::schema::SettingsMap;

/// Overlay `stored` on `defaults`, recursing into objects present in both.
///
/// Stored keys the defaults don't know about are kept.
pub fn merge_defaults(defaults: &SettingsMap, stored: &SettingsMap) -> SettingsMap {
    let mut merged = defaults.clone();
    for (key, value) in stored {
        let combined = match (merged.get(key), value) {
            (Some(Value::Object(default)), Value::Object(stored)) => {
                Value::Object(merge_defaults(default, stored))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), combined);
    }
    merged
}

/// Plugin data kept in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, SettingsMap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, plugin: &str, key: &str) -> Option<Value> {
        self.data
            .read()
            .get(plugin)
            .and_then(|entries| entries.get(key))
            .cloned()
    }
}

impl PersistenceGateway for MemoryStore {
    fn load_data(&self, plugin: &str, key: &str, default: Value) -> Result<Value> {
        Ok(self.get(plugin, key).unwrap_or(default))
    }

    fn save_data(&self, plugin: &str, key: &str, value: Value) -> Result<()> {
        self.data
            .write()
            .entry(plugin.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Plugin data kept as one JSON file per plugin: `<dir>/<plugin>.config.json`.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;

        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Data file for `plugin`. Names that could leave the data directory are rejected.
    pub fn file_path(&self, plugin: &str) -> Result<PathBuf> {
        if plugin.is_empty() || plugin.contains(['/', '\\']) {
            anyhow::bail!("Invalid plugin name for a data file: {:?}", plugin);
        }
        Ok(self.dir.join(format!("{}.config.json", plugin)))
    }

    fn read_entries(&self, plugin: &str) -> Result<SettingsMap> {
        let path = self.file_path(plugin)?;
        if !path.exists() {
            return Ok(SettingsMap::new());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        match value {
            Value::Object(entries) => Ok(entries),
            _ => anyhow::bail!("{} does not contain a JSON object", path.display()),
        }
    }
}

impl PersistenceGateway for FileStore {
    fn load_data(&self, plugin: &str, key: &str, default: Value) -> Result<Value> {
        let entries = self.read_entries(plugin)?;
        Ok(entries.get(key).cloned().unwrap_or(default))
    }

    fn save_data(&self, plugin: &str, key: &str, value: Value) -> Result<()> {
        let _guard = self.write_lock.lock();

        let mut entries = self.read_entries(plugin)?;
        entries.insert(key.to_string(), value);

        let path = self.file_path(plugin)?;
        let content = serde_json::to_string_pretty(&Value::Object(entries))?;
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
