use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{PluginError, PluginResult};
use crate::schema::{RawSchemaEntry, SettingsSchema};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
}

/// Information about a plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
    #[serde(default)]
    pub authors: Vec<Author>,
    /// Where the update check looks for newer releases.
    #[serde(default, rename = "updateSource", alias = "github_raw")]
    pub update_source: Option<String>,
}

impl PluginInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: version.into(),
            authors: Vec::new(),
            update_source: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_author(mut self, name: impl Into<String>) -> Self {
        self.authors.push(Author { name: name.into() });
        self
    }

    pub fn with_update_source(mut self, source: impl Into<String>) -> Self {
        self.update_source = Some(source.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Fixed,
    Improved,
    Progress,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogSection {
    pub title: String,
    #[serde(default, rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub items: Vec<String>,
}

/// Release notes shown once after each version change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Changelog {
    pub sections: Vec<ChangelogSection>,
}

impl Changelog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(
        mut self,
        title: impl Into<String>,
        kind: ChangeKind,
        items: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.sections.push(ChangelogSection {
            title: title.into(),
            kind,
            items: items.into_iter().map(Into::into).collect(),
        });
        self
    }
}

/// Descriptor file layout, before the schema has been validated.
#[derive(Debug, Deserialize)]
struct RawDescriptor {
    info: PluginInfo,
    #[serde(default)]
    changelog: Option<Changelog>,
    #[serde(default, rename = "settingsSchema", alias = "defaultConfig")]
    settings_schema: Option<Vec<RawSchemaEntry>>,
}

/// Static description of a plugin, handed over at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginDescriptor {
    pub info: PluginInfo,
    pub changelog: Option<Changelog>,
    pub settings_schema: Option<SettingsSchema>,
}

impl PluginDescriptor {
    pub fn new(info: PluginInfo) -> Self {
        Self {
            info,
            changelog: None,
            settings_schema: None,
        }
    }

    pub fn with_changelog(mut self, changelog: Changelog) -> Self {
        self.changelog = Some(changelog);
        self
    }

    pub fn with_settings_schema(mut self, schema: SettingsSchema) -> Self {
        self.settings_schema = Some(schema);
        self
    }

    /// Parse a JSON descriptor, validating its settings schema.
    pub fn from_json_str(json: &str) -> PluginResult<Self> {
        let raw: RawDescriptor = serde_json::from_str(json)?;
        let settings_schema = raw
            .settings_schema
            .map(SettingsSchema::from_raw)
            .transpose()?;

        let descriptor = Self {
            info: raw.info,
            changelog: raw.changelog,
            settings_schema,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn from_file(path: &Path) -> PluginResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> PluginResult<()> {
        if self.info.name.trim().is_empty() {
            return Err(PluginError::InvalidDescriptor(
                "plugin name is empty".to_string(),
            ));
        }
        if self.info.version.trim().is_empty() {
            return Err(PluginError::InvalidDescriptor(format!(
                "plugin '{}' has an empty version",
                self.info.name
            )));
        }
        Ok(())
    }
}
