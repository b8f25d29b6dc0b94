//! The live settings mapping written by widget change handlers.

use log::debug;
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::schema::SettingsMap;

/// Location of one setting: its category (if any) and its own id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettingKey {
    pub scope: Option<String>,
    pub id: String,
}

impl SettingKey {
    pub fn top_level(id: impl Into<String>) -> Self {
        Self {
            scope: None,
            id: id.into(),
        }
    }

    pub fn in_category(scope: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
            id: id.into(),
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}.{}", scope, self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

#[derive(Debug, Default)]
struct LiveState {
    values: SettingsMap,
    generation: u64,
    edited: bool,
}

impl LiveState {
    fn set(&mut self, key: &SettingKey, value: Value) {
        match &key.scope {
            None => {
                self.values.insert(key.id.clone(), value);
            }
            Some(scope) => {
                let group = self
                    .values
                    .entry(scope.clone())
                    .or_insert_with(|| Value::Object(SettingsMap::new()));
                if !group.is_object() {
                    *group = Value::Object(SettingsMap::new());
                }
                if let Value::Object(group) = group {
                    group.insert(key.id.clone(), value);
                }
            }
        }
    }
}

/// Shared settings values for one plugin.
///
/// Cloning shares the same underlying mapping.
#[derive(Debug, Clone, Default)]
pub struct LiveSettings {
    state: Arc<RwLock<LiveState>>,
}

impl LiveSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SettingsMap {
        self.state.read().values.clone()
    }

    /// Swap in a new mapping. Installed handlers stay valid.
    pub fn replace(&self, values: SettingsMap) {
        self.state.write().values = values;
    }

    pub fn get(&self, key: &SettingKey) -> Option<Value> {
        let state = self.state.read();
        match &key.scope {
            None => state.values.get(&key.id).cloned(),
            Some(scope) => state
                .values
                .get(scope)
                .and_then(|group| group.get(&key.id))
                .cloned(),
        }
    }

    /// True once a current handler has written a value that was not saved yet.
    pub fn is_edited(&self) -> bool {
        self.state.read().edited
    }

    /// Clear the mapping and retire every handler handed out so far.
    pub(crate) fn reset(&self) -> u64 {
        let mut state = self.state.write();
        state.values = SettingsMap::new();
        state.generation += 1;
        state.edited = false;
        state.generation
    }

    pub(crate) fn mark_saved(&self) {
        self.state.write().edited = false;
    }

    pub(crate) fn open_scope(&self, scope: &str) {
        self.state
            .write()
            .values
            .insert(scope.to_string(), Value::Object(SettingsMap::new()));
    }

    pub(crate) fn record(&self, key: &SettingKey, value: Value) {
        self.state.write().set(key, value);
    }

    pub(crate) fn handler(&self, key: SettingKey, generation: u64) -> ChangeHandler {
        ChangeHandler {
            key,
            generation,
            live: self.clone(),
        }
    }
}

/// Writes new values for exactly one setting key.
#[derive(Debug, Clone)]
pub struct ChangeHandler {
    key: SettingKey,
    generation: u64,
    live: LiveSettings,
}

impl ChangeHandler {
    pub fn key(&self) -> &SettingKey {
        &self.key
    }

    /// Store `value` under this handler's key.
    ///
    /// Returns false when the panel that produced this handler has since been
    /// rebuilt; the value is dropped in that case.
    pub fn call(&self, value: Value) -> bool {
        let mut state = self.live.state.write();
        if state.generation != self.generation {
            debug!("Ignoring change to {} from a rebuilt settings panel", self.key);
            return false;
        }
        state.set(&self.key, value);
        state.edited = true;
        true
    }
}
