use serde_json::Value;

use super::{Control, PanelItem, SettingWidget, SettingsPanel};
use crate::gateway::{PanelRenderer, RenderedElement};

/// Renders a settings panel as indented plain text.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextRenderer;

impl TextRenderer {
    fn render_widget(out: &mut String, widget: &SettingWidget, indent: &str) {
        let value = match &widget.control {
            Control::FilePicker => "(choose file)".to_string(),
            Control::Slider { min, max, value, .. } => {
                format!("{} [{}..{}]", display_value(value), min, max)
            }
            control => control.value().map(display_value).unwrap_or_default(),
        };

        out.push_str(&format!(
            "{}{:<24} {:<9} {}\n",
            indent,
            widget.name,
            widget.control.kind(),
            value
        ));
        if !widget.note.is_empty() {
            out.push_str(&format!("{}    {}\n", indent, widget.note));
        }
    }
}

impl PanelRenderer for TextRenderer {
    fn render(&self, panel: &SettingsPanel) -> RenderedElement {
        let mut out = String::new();

        for item in &panel.items {
            match item {
                PanelItem::Setting(widget) => Self::render_widget(&mut out, widget, ""),
                PanelItem::Group(group) => {
                    let marker = match (group.collapsible, group.shown) {
                        (true, true) => "▾ ",
                        (true, false) => "▸ ",
                        (false, _) => "",
                    };
                    out.push_str(&format!("{}{}\n", marker, group.name));
                    for widget in &group.settings {
                        Self::render_widget(&mut out, widget, "  ");
                    }
                }
            }
        }

        RenderedElement(out)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
