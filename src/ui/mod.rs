pub mod live;
pub mod render;

use log::{debug, error, warn};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::gateway::PersistenceGateway;
use crate::schema::{SchemaEntry, SettingCategory, SettingKind, SettingOption, SettingSpec, SettingsSchema};

pub use live::{ChangeHandler, LiveSettings, SettingKey};
pub use render::TextRenderer;

/// The input control a setting is edited with.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    ColorPicker {
        value: Value,
        disabled: bool,
        preset_colors: Vec<Value>,
    },
    Dropdown {
        value: Value,
        options: Vec<SettingOption>,
    },
    FilePicker,
    Keybind {
        value: Value,
    },
    RadioGroup {
        value: Value,
        options: Vec<SettingOption>,
        disabled: bool,
    },
    Slider {
        min: f64,
        max: f64,
        value: Value,
        markers: Option<Vec<f64>>,
        stick_to_markers: Option<bool>,
    },
    Switch {
        value: Value,
        disabled: bool,
    },
    Textbox {
        value: Value,
        placeholder: String,
    },
}

impl Control {
    pub fn kind(&self) -> &'static str {
        match self {
            Control::ColorPicker { .. } => "color",
            Control::Dropdown { .. } => "dropdown",
            Control::FilePicker => "file",
            Control::Keybind { .. } => "keybind",
            Control::RadioGroup { .. } => "radio",
            Control::Slider { .. } => "slider",
            Control::Switch { .. } => "switch",
            Control::Textbox { .. } => "textbox",
        }
    }

    /// Current value, if the control shows one.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Control::FilePicker => None,
            Control::ColorPicker { value, .. }
            | Control::Dropdown { value, .. }
            | Control::Keybind { value }
            | Control::RadioGroup { value, .. }
            | Control::Slider { value, .. }
            | Control::Switch { value, .. }
            | Control::Textbox { value, .. } => Some(value),
        }
    }
}

/// One rendered setting and the handler its control reports changes to.
#[derive(Debug, Clone)]
pub struct SettingWidget {
    pub name: String,
    pub note: String,
    pub control: Control,
    pub on_change: ChangeHandler,
}

#[derive(Debug, Clone)]
pub struct SettingGroup {
    pub id: String,
    pub name: String,
    pub shown: bool,
    pub collapsible: bool,
    pub settings: Vec<SettingWidget>,
}

#[derive(Debug, Clone)]
pub enum PanelItem {
    Setting(SettingWidget),
    Group(SettingGroup),
}

/// Persists the live settings of the plugin a panel was built for.
#[derive(Clone)]
pub struct PanelSaver {
    plugin_name: String,
    live: LiveSettings,
    persistence: Arc<dyn PersistenceGateway>,
}

impl PanelSaver {
    pub fn save(&self) {
        let settings = self.live.snapshot();
        match self.persistence.save_settings(&self.plugin_name, &settings) {
            Ok(()) => self.live.mark_saved(),
            Err(e) => error!("Failed to save settings for {}: {:#}", self.plugin_name, e),
        }
    }
}

impl fmt::Debug for PanelSaver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelSaver")
            .field("plugin_name", &self.plugin_name)
            .finish_non_exhaustive()
    }
}

/// Widget tree for a plugin's settings, in schema order.
#[derive(Debug, Clone)]
pub struct SettingsPanel {
    pub items: Vec<PanelItem>,
    saver: PanelSaver,
}

impl SettingsPanel {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn plugin_name(&self) -> &str {
        &self.saver.plugin_name
    }

    /// Find the widget editing `key`.
    pub fn widget(&self, key: &SettingKey) -> Option<&SettingWidget> {
        self.items.iter().find_map(|item| match item {
            PanelItem::Setting(widget) if widget.on_change.key() == key => Some(widget),
            PanelItem::Group(group) => group
                .settings
                .iter()
                .find(|widget| widget.on_change.key() == key),
            _ => None,
        })
    }

    /// Whether any widget changed a value since the panel was built or last saved.
    pub fn is_edited(&self) -> bool {
        self.saver.live.is_edited()
    }

    /// Persist the values the panel's handlers have written so far.
    pub fn save(&self) {
        self.saver.save();
    }
}

/// Build the widget for one setting.
///
/// Settings of an unknown kind get no widget.
pub fn build_setting(spec: &SettingSpec, on_change: ChangeHandler) -> Option<SettingWidget> {
    let value = spec.value.clone();
    let control = match &spec.kind {
        SettingKind::Color {
            disabled,
            preset_colors,
        } => Control::ColorPicker {
            value,
            disabled: *disabled,
            preset_colors: preset_colors.clone(),
        },
        SettingKind::Dropdown { options } => Control::Dropdown {
            value,
            options: options.clone(),
        },
        SettingKind::File => Control::FilePicker,
        SettingKind::Keybind => Control::Keybind { value },
        SettingKind::Radio { options, disabled } => Control::RadioGroup {
            value,
            options: options.clone(),
            disabled: *disabled,
        },
        SettingKind::Slider {
            min,
            max,
            markers,
            stick_to_markers,
        } => Control::Slider {
            min: *min,
            max: *max,
            value,
            markers: markers.clone(),
            stick_to_markers: *stick_to_markers,
        },
        SettingKind::Switch { disabled } => Control::Switch {
            value,
            disabled: *disabled,
        },
        SettingKind::Textbox { placeholder } => Control::Textbox {
            value,
            placeholder: placeholder.clone().unwrap_or_default(),
        },
        SettingKind::Unknown(kind) => {
            warn!("Skipping setting '{}' with unknown type '{}'", spec.id, kind);
            return None;
        }
    };

    Some(SettingWidget {
        name: spec.name.clone(),
        note: spec.note.clone(),
        control,
        on_change,
    })
}

/// Walk `schema`, resetting `live` to the schema's values and producing one
/// panel item per top-level entry.
///
/// Handlers from any earlier build of the same `live` mapping stop writing.
pub fn build_settings_panel(
    plugin_name: &str,
    schema: &SettingsSchema,
    live: &LiveSettings,
    persistence: Arc<dyn PersistenceGateway>,
) -> SettingsPanel {
    let generation = live.reset();

    let mut items = Vec::with_capacity(schema.len());
    for entry in schema.entries() {
        match entry {
            SchemaEntry::Setting(spec) => {
                let key = SettingKey::top_level(spec.id.clone());
                live.record(&key, spec.value.clone());
                if let Some(widget) = build_setting(spec, live.handler(key, generation)) {
                    items.push(PanelItem::Setting(widget));
                }
            }
            SchemaEntry::Category(category) => {
                items.push(PanelItem::Group(build_group(category, live, generation)));
            }
        }
    }

    debug!("Built settings panel for {} with {} item(s)", plugin_name, items.len());

    SettingsPanel {
        items,
        saver: PanelSaver {
            plugin_name: plugin_name.to_string(),
            live: live.clone(),
            persistence,
        },
    }
}

fn build_group(category: &SettingCategory, live: &LiveSettings, generation: u64) -> SettingGroup {
    live.open_scope(&category.id);

    let settings = category
        .settings
        .iter()
        .filter_map(|spec| {
            let key = SettingKey::in_category(category.id.clone(), spec.id.clone());
            live.record(&key, spec.value.clone());
            build_setting(spec, live.handler(key, generation))
        })
        .collect();

    SettingGroup {
        id: category.id.clone(),
        name: category.name.clone(),
        shown: category.shown,
        collapsible: category.collapsible,
        settings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawSchemaEntry;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn schema(value: Value) -> SettingsSchema {
        let raw: Vec<RawSchemaEntry> = serde_json::from_value(value).unwrap();
        SettingsSchema::from_raw(raw).unwrap()
    }

    fn sample_schema() -> SettingsSchema {
        schema(json!([
            {"id": "enabled", "type": "switch", "name": "Enabled", "value": true},
            {"id": "greeting", "type": "textbox", "name": "Greeting", "value": "hello"},
            {"id": "chat", "type": "category", "name": "Chat", "collapsible": true, "shown": false,
             "settings": [
                {"id": "volume", "type": "slider", "name": "Volume", "value": 5, "min": 0, "max": 10,
                 "markers": [0, 5, 10], "stickToMarkers": true},
                {"id": "mode", "type": "dropdown", "name": "Mode", "value": "a",
                 "options": [{"label": "A", "value": "a"}, {"label": "B", "value": "b"}]}
             ]}
        ]))
    }

    #[test]
    fn test_panel_follows_schema_order() {
        let live = LiveSettings::new();
        let panel = build_settings_panel("Demo", &sample_schema(), &live, Arc::new(MemoryStore::new()));

        assert_eq!(panel.len(), 3);
        assert!(matches!(&panel.items[0], PanelItem::Setting(w) if w.name == "Enabled"));
        assert!(matches!(&panel.items[1], PanelItem::Setting(w) if w.name == "Greeting"));
        match &panel.items[2] {
            PanelItem::Group(group) => {
                assert_eq!(group.name, "Chat");
                assert!(group.collapsible);
                assert!(!group.shown);
                let names: Vec<_> = group.settings.iter().map(|w| w.name.as_str()).collect();
                assert_eq!(names, vec!["Volume", "Mode"]);
            }
            other => panic!("expected a group, got {:?}", other),
        }
    }

    #[test]
    fn test_live_settings_mirror_schema() {
        let live = LiveSettings::new();
        build_settings_panel("Demo", &sample_schema(), &live, Arc::new(MemoryStore::new()));

        assert_eq!(
            Value::Object(live.snapshot()),
            json!({
                "enabled": true,
                "greeting": "hello",
                "chat": {"volume": 5, "mode": "a"}
            })
        );
    }

    #[test]
    fn test_change_handlers_touch_only_their_key() {
        let live = LiveSettings::new();
        let panel = build_settings_panel("Demo", &sample_schema(), &live, Arc::new(MemoryStore::new()));

        let greeting = panel.widget(&SettingKey::top_level("greeting")).unwrap();
        assert!(greeting.on_change.call(json!("bye")));
        let mode = panel.widget(&SettingKey::in_category("chat", "mode")).unwrap();
        assert!(mode.on_change.call(json!("b")));
        assert!(mode.on_change.call(json!("a")));
        assert!(mode.on_change.call(json!("b")));

        assert_eq!(
            Value::Object(live.snapshot()),
            json!({
                "enabled": true,
                "greeting": "bye",
                "chat": {"volume": 5, "mode": "b"}
            })
        );
    }

    #[test]
    fn test_rebuild_discards_unsaved_edits() {
        let live = LiveSettings::new();
        let schema = sample_schema();
        let first = build_settings_panel("Demo", &schema, &live, Arc::new(MemoryStore::new()));
        let stale = first.widget(&SettingKey::top_level("enabled")).unwrap().on_change.clone();
        assert!(stale.call(json!(false)));

        build_settings_panel("Demo", &schema, &live, Arc::new(MemoryStore::new()));
        assert!(!stale.call(json!(false)));
        assert_eq!(live.get(&SettingKey::top_level("enabled")), Some(json!(true)));
    }

    #[test]
    fn test_panel_save_persists_live_settings() {
        let store = Arc::new(MemoryStore::new());
        let live = LiveSettings::new();
        let panel = build_settings_panel("Demo", &sample_schema(), &live, store.clone());

        panel
            .widget(&SettingKey::in_category("chat", "volume"))
            .unwrap()
            .on_change
            .call(json!(7));
        panel.save();

        assert_eq!(
            store.get("Demo", "settings"),
            Some(json!({"enabled": true, "greeting": "hello", "chat": {"volume": 7, "mode": "a"}}))
        );
    }

    #[test]
    fn test_untouched_panel_is_not_edited() {
        let store = Arc::new(MemoryStore::new());
        let live = LiveSettings::new();
        let panel = build_settings_panel("Demo", &sample_schema(), &live, store.clone());
        assert!(!panel.is_edited());

        panel
            .widget(&SettingKey::top_level("enabled"))
            .unwrap()
            .on_change
            .call(json!(false));
        assert!(panel.is_edited());

        panel.save();
        assert!(!panel.is_edited());
        assert_eq!(
            store.get("Demo", "settings").map(|s| s["enabled"].clone()),
            Some(json!(false))
        );
    }

    #[test]
    fn test_build_setting_forwards_extras() {
        let live = LiveSettings::new();
        let generation = live.reset();
        let handler = || live.handler(SettingKey::top_level("x"), generation);

        let textbox = SettingSpec::new("x", "Text", SettingKind::textbox(), "v");
        let widget = build_setting(&textbox, handler()).unwrap();
        assert_eq!(
            widget.control,
            Control::Textbox {
                value: json!("v"),
                placeholder: String::new()
            }
        );

        let slider = SettingSpec::new(
            "x",
            "Slide",
            SettingKind::Slider {
                min: 1.0,
                max: 3.0,
                markers: Some(vec![1.0, 2.0, 3.0]),
                stick_to_markers: Some(true),
            },
            2,
        );
        let widget = build_setting(&slider, handler()).unwrap();
        assert_eq!(
            widget.control,
            Control::Slider {
                min: 1.0,
                max: 3.0,
                value: json!(2),
                markers: Some(vec![1.0, 2.0, 3.0]),
                stick_to_markers: Some(true)
            }
        );

        let color = SettingSpec::new(
            "x",
            "Color",
            SettingKind::Color {
                disabled: true,
                preset_colors: vec![json!(0x1abc9c)],
            },
            "#fff",
        );
        let widget = build_setting(&color, handler()).unwrap();
        assert_eq!(widget.control.kind(), "color");
        assert!(matches!(widget.control, Control::ColorPicker { disabled: true, .. }));

        let file = SettingSpec::new("x", "File", SettingKind::File, Value::Null);
        assert_eq!(build_setting(&file, handler()).unwrap().control.value(), None);
    }

    #[test]
    fn test_unknown_kind_is_skipped_but_recorded() {
        let live = LiveSettings::new();
        let schema = schema(json!([
            {"id": "known", "type": "switch", "name": "Known", "value": true},
            {"id": "odd", "type": "hologram", "name": "Odd", "value": 1},
            {"id": "group", "type": "category", "name": "Group", "settings": [
                {"id": "odd", "type": "hologram", "value": 2}
            ]}
        ]));
        let panel = build_settings_panel("Demo", &schema, &live, Arc::new(MemoryStore::new()));

        assert_eq!(panel.len(), 2);
        match &panel.items[1] {
            PanelItem::Group(group) => assert!(group.settings.is_empty()),
            other => panic!("expected a group, got {:?}", other),
        }
        assert_eq!(
            Value::Object(live.snapshot()),
            json!({"known": true, "odd": 1, "group": {"odd": 2}})
        );
    }
}
