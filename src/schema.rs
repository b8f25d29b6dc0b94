//! Settings schema model.
//!
//! A schema is an ordered list of entries. Each entry is either a single
//! setting or a category grouping settings one level deep. Schemas arrive
//! either as JSON (`RawSchemaEntry`, validated by [`SettingsSchema::from_raw`])
//! or through the builder methods on [`SettingSpec`] and [`SettingCategory`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::SchemaError;

/// Settings values keyed by setting id, or by category id for nested maps.
pub type SettingsMap = Map<String, Value>;

const CATEGORY_TYPE: &str = "category";

/// One choice of a dropdown or radio group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingOption {
    pub label: String,
    pub value: Value,
}

impl SettingOption {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// The kind of a setting together with the extras only that kind uses.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingKind {
    Color {
        disabled: bool,
        preset_colors: Vec<Value>,
    },
    Dropdown {
        options: Vec<SettingOption>,
    },
    File,
    Keybind,
    Radio {
        options: Vec<SettingOption>,
        disabled: bool,
    },
    Slider {
        min: f64,
        max: f64,
        markers: Option<Vec<f64>>,
        stick_to_markers: Option<bool>,
    },
    Switch {
        disabled: bool,
    },
    Textbox {
        placeholder: Option<String>,
    },
    /// A type tag this crate has no widget for.
    Unknown(String),
}

impl SettingKind {
    pub fn as_str(&self) -> &str {
        match self {
            SettingKind::Color { .. } => "color",
            SettingKind::Dropdown { .. } => "dropdown",
            SettingKind::File => "file",
            SettingKind::Keybind => "keybind",
            SettingKind::Radio { .. } => "radio",
            SettingKind::Slider { .. } => "slider",
            SettingKind::Switch { .. } => "switch",
            SettingKind::Textbox { .. } => "textbox",
            SettingKind::Unknown(name) => name,
        }
    }

    pub fn switch() -> Self {
        SettingKind::Switch { disabled: false }
    }

    pub fn textbox() -> Self {
        SettingKind::Textbox { placeholder: None }
    }

    pub fn slider(min: f64, max: f64) -> Self {
        SettingKind::Slider {
            min,
            max,
            markers: None,
            stick_to_markers: None,
        }
    }

    pub fn dropdown(options: Vec<SettingOption>) -> Self {
        SettingKind::Dropdown { options }
    }
}

/// A single user-configurable setting.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingSpec {
    pub id: String,
    pub name: String,
    pub note: String,
    pub value: Value,
    pub kind: SettingKind,
}

impl SettingSpec {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: SettingKind,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            note: String::new(),
            value: value.into(),
            kind,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// A named group of settings rendered together.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingCategory {
    pub id: String,
    pub name: String,
    pub collapsible: bool,
    pub shown: bool,
    pub settings: Vec<SettingSpec>,
}

impl SettingCategory {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            collapsible: false,
            shown: false,
            settings: Vec::new(),
        }
    }

    pub fn collapsible(mut self, collapsible: bool) -> Self {
        self.collapsible = collapsible;
        self
    }

    pub fn shown(mut self, shown: bool) -> Self {
        self.shown = shown;
        self
    }

    pub fn with_setting(mut self, setting: SettingSpec) -> Self {
        self.settings.push(setting);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaEntry {
    Setting(SettingSpec),
    Category(SettingCategory),
}

impl SchemaEntry {
    pub fn id(&self) -> &str {
        match self {
            SchemaEntry::Setting(spec) => &spec.id,
            SchemaEntry::Category(category) => &category.id,
        }
    }
}

impl From<SettingSpec> for SchemaEntry {
    fn from(spec: SettingSpec) -> Self {
        SchemaEntry::Setting(spec)
    }
}

impl From<SettingCategory> for SchemaEntry {
    fn from(category: SettingCategory) -> Self {
        SchemaEntry::Category(category)
    }
}

/// Schema entry as written in a plugin descriptor file.
///
/// Settings and categories share one shape, discriminated by `type`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchemaEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub collapsible: bool,
    #[serde(default)]
    pub shown: bool,
    #[serde(default)]
    pub settings: Vec<RawSchemaEntry>,
    #[serde(default)]
    pub options: Option<Vec<SettingOption>>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub markers: Option<Vec<f64>>,
    #[serde(default)]
    pub stick_to_markers: Option<bool>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub disabled: Option<bool>,
    #[serde(default)]
    pub preset_colors: Option<Vec<Value>>,
}

/// A validated settings schema.
///
/// Ids are unique among siblings and categories never nest.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingsSchema {
    entries: Vec<SchemaEntry>,
}

impl SettingsSchema {
    pub fn new(entries: Vec<SchemaEntry>) -> Result<Self, SchemaError> {
        let mut top_ids = HashSet::new();
        for (idx, entry) in entries.iter().enumerate() {
            require_id(entry.id(), || format!("settings[{}]", idx))?;
            unique(&mut top_ids, "the top level", entry.id())?;

            match entry {
                SchemaEntry::Setting(spec) => validate_kind(spec)?,
                SchemaEntry::Category(category) => {
                    let mut leaf_ids = HashSet::new();
                    for (leaf_idx, spec) in category.settings.iter().enumerate() {
                        require_id(&spec.id, || {
                            format!("category '{}' settings[{}]", category.id, leaf_idx)
                        })?;
                        unique(&mut leaf_ids, &format!("category '{}'", category.id), &spec.id)?;
                        validate_kind(spec)?;
                    }
                }
            }
        }

        Ok(Self { entries })
    }

    /// Validate entries parsed from a descriptor file.
    pub fn from_raw(raw: Vec<RawSchemaEntry>) -> Result<Self, SchemaError> {
        let mut entries = Vec::with_capacity(raw.len());
        for (idx, entry) in raw.into_iter().enumerate() {
            let position = format!("settings[{}]", idx);
            if entry.kind.as_deref() == Some(CATEGORY_TYPE) {
                entries.push(SchemaEntry::Category(category_from_raw(entry, position)?));
            } else {
                entries.push(SchemaEntry::Setting(setting_from_raw(entry, position, None)?));
            }
        }
        Self::new(entries)
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fallback settings used whenever nothing has been persisted yet.
    ///
    /// Top-level settings map id to value; each category maps its id to an
    /// object of its own settings' values.
    pub fn default_settings(&self) -> SettingsMap {
        let mut defaults = SettingsMap::new();
        for entry in &self.entries {
            match entry {
                SchemaEntry::Setting(spec) => {
                    defaults.insert(spec.id.clone(), spec.value.clone());
                }
                SchemaEntry::Category(category) => {
                    let nested: SettingsMap = category
                        .settings
                        .iter()
                        .map(|spec| (spec.id.clone(), spec.value.clone()))
                        .collect();
                    defaults.insert(category.id.clone(), Value::Object(nested));
                }
            }
        }
        defaults
    }
}

fn require_id(id: &str, position: impl FnOnce() -> String) -> Result<(), SchemaError> {
    if id.trim().is_empty() {
        return Err(SchemaError::MissingId {
            position: position(),
        });
    }
    Ok(())
}

fn unique(seen: &mut HashSet<String>, scope: &str, id: &str) -> Result<(), SchemaError> {
    if !seen.insert(id.to_string()) {
        return Err(SchemaError::DuplicateId {
            scope: scope.to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn validate_kind(spec: &SettingSpec) -> Result<(), SchemaError> {
    match &spec.kind {
        SettingKind::Slider { min, max, .. } if min.is_nan() || max.is_nan() => {
            Err(SchemaError::MissingSliderBounds {
                id: spec.id.clone(),
            })
        }
        _ => Ok(()),
    }
}

fn category_from_raw(raw: RawSchemaEntry, position: String) -> Result<SettingCategory, SchemaError> {
    let id = raw_id(raw.id, &position)?;
    let mut settings = Vec::with_capacity(raw.settings.len());
    for (idx, leaf) in raw.settings.into_iter().enumerate() {
        let leaf_position = format!("category '{}' settings[{}]", id, idx);
        settings.push(setting_from_raw(leaf, leaf_position, Some(&id))?);
    }

    Ok(SettingCategory {
        id,
        name: raw.name,
        collapsible: raw.collapsible,
        shown: raw.shown,
        settings,
    })
}

fn setting_from_raw(
    raw: RawSchemaEntry,
    position: String,
    parent: Option<&str>,
) -> Result<SettingSpec, SchemaError> {
    let id = raw_id(raw.id, &position)?;
    let type_name = raw
        .kind
        .ok_or_else(|| SchemaError::MissingKind { id: id.clone() })?;

    let kind = match type_name.as_str() {
        CATEGORY_TYPE => {
            return Err(SchemaError::NestedCategory {
                parent: parent.unwrap_or_default().to_string(),
                id,
            })
        }
        "color" => SettingKind::Color {
            disabled: raw.disabled.unwrap_or(false),
            preset_colors: raw.preset_colors.unwrap_or_default(),
        },
        "dropdown" => SettingKind::Dropdown {
            options: require_options(raw.options, "dropdown", &id)?,
        },
        "file" => SettingKind::File,
        "keybind" => SettingKind::Keybind,
        "radio" => SettingKind::Radio {
            options: require_options(raw.options, "radio", &id)?,
            disabled: raw.disabled.unwrap_or(false),
        },
        "slider" => match (raw.min, raw.max) {
            (Some(min), Some(max)) => SettingKind::Slider {
                min,
                max,
                markers: raw.markers,
                stick_to_markers: raw.stick_to_markers,
            },
            _ => return Err(SchemaError::MissingSliderBounds { id }),
        },
        "switch" => SettingKind::Switch {
            disabled: raw.disabled.unwrap_or(false),
        },
        "textbox" => SettingKind::Textbox {
            placeholder: raw.placeholder,
        },
        _ => SettingKind::Unknown(type_name),
    };

    Ok(SettingSpec {
        id,
        name: raw.name,
        note: raw.note,
        value: raw.value,
        kind,
    })
}

fn raw_id(id: Option<String>, position: &str) -> Result<String, SchemaError> {
    match id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(SchemaError::MissingId {
            position: position.to_string(),
        }),
    }
}

fn require_options(
    options: Option<Vec<SettingOption>>,
    kind: &str,
    id: &str,
) -> Result<Vec<SettingOption>, SchemaError> {
    options.ok_or_else(|| SchemaError::MissingOptions {
        kind: kind.to_string(),
        id: id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<SettingsSchema, SchemaError> {
        let raw: Vec<RawSchemaEntry> = serde_json::from_value(value).unwrap();
        SettingsSchema::from_raw(raw)
    }

    #[test]
    fn test_default_settings_follow_schema_shape() {
        let schema = parse(json!([
            {"id": "enabled", "type": "switch", "name": "Enabled", "value": true},
            {"id": "chat", "type": "category", "name": "Chat", "settings": [
                {"id": "message", "type": "textbox", "name": "Message", "value": "hi"},
                {"id": "enabled", "type": "switch", "name": "Enabled", "value": false}
            ]},
            {"id": "empty", "type": "category", "name": "Empty", "settings": []}
        ]))
        .unwrap();

        // A category's defaults come from its own leaves (leaf id -> leaf
        // value), never from the outer entry list. Each category maps its own
        // leaf ids, even when a leaf id repeats an id from another scope.
        assert_eq!(
            Value::Object(schema.default_settings()),
            json!({
                "enabled": true,
                "chat": {"message": "hi", "enabled": false},
                "empty": {}
            })
        );
    }

    #[test]
    fn test_missing_id_is_rejected() {
        let err = parse(json!([{"type": "switch", "name": "No id", "value": true}])).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingId {
                position: "settings[0]".to_string()
            }
        );

        let err = parse(json!([
            {"id": "group", "type": "category", "settings": [{"type": "switch", "value": true}]}
        ]))
        .unwrap_err();
        assert!(matches!(err, SchemaError::MissingId { .. }));
    }

    #[test]
    fn test_missing_kind_is_rejected() {
        let err = parse(json!([{"id": "a", "value": 1}])).unwrap_err();
        assert_eq!(err, SchemaError::MissingKind { id: "a".to_string() });
    }

    #[test]
    fn test_duplicate_sibling_ids_are_rejected() {
        let err = parse(json!([
            {"id": "a", "type": "switch", "value": true},
            {"id": "a", "type": "textbox", "value": ""}
        ]))
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateId { ref id, .. } if id == "a"));
    }

    #[test]
    fn test_nested_categories_are_rejected() {
        let err = parse(json!([
            {"id": "outer", "type": "category", "settings": [
                {"id": "inner", "type": "category", "settings": []}
            ]}
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::NestedCategory {
                parent: "outer".to_string(),
                id: "inner".to_string()
            }
        );
    }

    #[test]
    fn test_slider_requires_bounds() {
        let err = parse(json!([{"id": "volume", "type": "slider", "value": 5, "min": 0}])).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingSliderBounds {
                id: "volume".to_string()
            }
        );
    }

    #[test]
    fn test_choice_kinds_require_options() {
        let err = parse(json!([{"id": "mode", "type": "dropdown", "value": "a"}])).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingOptions {
                kind: "dropdown".to_string(),
                id: "mode".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_kind_is_kept() {
        let schema = parse(json!([{"id": "x", "type": "hologram", "value": 3}])).unwrap();
        match &schema.entries()[0] {
            SchemaEntry::Setting(spec) => {
                assert_eq!(spec.kind, SettingKind::Unknown("hologram".to_string()));
                assert_eq!(spec.kind.as_str(), "hologram");
            }
            other => panic!("unexpected entry: {:?}", other),
        }
    }

    #[test]
    fn test_builder_schema_is_validated() {
        let result = SettingsSchema::new(vec![
            SettingCategory::new("group", "Group")
                .with_setting(SettingSpec::new("a", "A", SettingKind::switch(), true))
                .with_setting(SettingSpec::new("a", "A again", SettingKind::switch(), false))
                .into(),
        ]);
        assert_eq!(
            result.unwrap_err(),
            SchemaError::DuplicateId {
                scope: "category 'group'".to_string(),
                id: "a".to_string()
            }
        );
    }
}
