//! Boop Counter: counts boops and announces milestones in the chatbox.

use log::info;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use plugin_base_core::plugin_api::{ChangeKind, Changelog};
use plugin_base_core::schema::{SettingCategory, SettingKind, SettingSpec, SettingsMap, SettingsSchema};
use plugin_base_core::{PluginDescriptor, PluginHooks, PluginInfo, SchemaError};

const DEFAULT_EVERY: u64 = 10;
const DEFAULT_MESSAGE: &str = "Boops today: {today} / total: {total}";

pub fn settings_schema() -> Result<SettingsSchema, SchemaError> {
    SettingsSchema::new(vec![
        SettingSpec::new("announce", "Announce boops", SettingKind::switch(), true)
            .with_note("Send a chatbox message every few boops")
            .into(),
        SettingCategory::new("chatbox", "Chatbox")
            .collapsible(true)
            .shown(true)
            .with_setting(
                SettingSpec::new(
                    "every",
                    "Announce every",
                    SettingKind::slider(1.0, 100.0),
                    DEFAULT_EVERY,
                )
                .with_note("Boops between announcements"),
            )
            .with_setting(SettingSpec::new(
                "message",
                "Message",
                SettingKind::Textbox {
                    placeholder: Some(DEFAULT_MESSAGE.to_string()),
                },
                DEFAULT_MESSAGE,
            ))
            .into(),
    ])
}

pub fn descriptor() -> Result<PluginDescriptor, SchemaError> {
    Ok(PluginDescriptor::new(
        PluginInfo::new("Boop Counter", "0.2.0")
            .with_description("Counts boops received and announces them in the chatbox")
            .with_author("Kyder"),
    )
    .with_changelog(
        Changelog::new()
            .with_section("Added", ChangeKind::Added, ["Settings panel for announcements"])
            .with_section("Fixed", ChangeKind::Fixed, ["Daily count resets at midnight"]),
    )
    .with_settings_schema(settings_schema()?))
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoopStats {
    pub today: u32,
    pub total: u32,
    pub running: bool,
    announce: bool,
    every: u64,
    message: String,
    last_pressed: bool,
    last_boop_timestamp: u64,
}

impl Default for BoopStats {
    fn default() -> Self {
        Self {
            today: 0,
            total: 0,
            running: false,
            announce: true,
            every: DEFAULT_EVERY,
            message: DEFAULT_MESSAGE.to_string(),
            last_pressed: false,
            last_boop_timestamp: 0,
        }
    }
}

// One day = 86400 seconds
fn is_different_day(ts1: u64, ts2: u64) -> bool {
    ts1 / 86400 != ts2 / 86400
}

/// Hooks for the Boop Counter plugin.
///
/// Clones share the same counters, so the host can keep one to feed boops
/// in after handing another to the plugin.
#[derive(Debug, Clone, Default)]
pub struct BoopCounter {
    stats: Arc<Mutex<BoopStats>>,
}

impl BoopCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> BoopStats {
        self.stats.lock().clone()
    }

    /// Feed the boop contact state at `timestamp` (unix seconds).
    ///
    /// A boop is counted on each released-to-pressed edge. Returns the
    /// chatbox message to send when the total reaches a multiple of the
    /// configured interval.
    pub fn record_contact(&self, pressed: bool, timestamp: u64) -> Option<String> {
        let mut stats = self.stats.lock();
        if !stats.running {
            return None;
        }

        let rising = pressed && !stats.last_pressed;
        stats.last_pressed = pressed;
        if !rising {
            return None;
        }

        if stats.last_boop_timestamp != 0
            && is_different_day(stats.last_boop_timestamp, timestamp)
        {
            stats.today = 0;
        }
        stats.last_boop_timestamp = timestamp;
        stats.today += 1;
        stats.total += 1;

        if stats.announce && u64::from(stats.total) % stats.every == 0 {
            Some(
                stats
                    .message
                    .replace("{today}", &stats.today.to_string())
                    .replace("{total}", &stats.total.to_string()),
            )
        } else {
            None
        }
    }
}

impl PluginHooks for BoopCounter {
    fn on_start(&mut self, settings: &SettingsMap) {
        let mut stats = self.stats.lock();
        stats.announce = settings
            .get("announce")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        let chatbox = settings.get("chatbox");
        stats.every = chatbox
            .and_then(|c| c.get("every"))
            .and_then(Value::as_f64)
            .map(|every| every.round().max(1.0) as u64)
            .unwrap_or(DEFAULT_EVERY);
        stats.message = chatbox
            .and_then(|c| c.get("message"))
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .unwrap_or(DEFAULT_MESSAGE)
            .to_string();
        stats.running = true;

        info!("Boop Counter announcing every {} boop(s)", stats.every);
    }

    fn on_stop(&mut self) {
        let mut stats = self.stats.lock();
        stats.running = false;
        stats.last_pressed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::RwLock;
    use plugin_base_core::gateway::{Gateways, PersistenceGateway};
    use plugin_base_core::ui::{SettingKey, TextRenderer};
    use plugin_base_core::{ConsoleLog, MemoryStore, Plugin, UpdateQueue};
    use serde_json::json;

    const DAY: u64 = 86400;

    fn gateways(store: Arc<MemoryStore>) -> Gateways {
        Gateways {
            persistence: store,
            modals: Arc::new(RwLock::new(ConsoleLog::new())),
            updates: Arc::new(UpdateQueue::new(true)),
            renderer: Arc::new(TextRenderer),
        }
    }

    #[test]
    fn test_counts_rising_edges_only() {
        let counter = BoopCounter::new();
        let store = Arc::new(MemoryStore::new());
        let mut plugin = Plugin::new(descriptor().unwrap(), counter.clone(), gateways(store)).unwrap();

        assert_eq!(counter.record_contact(true, DAY), None);
        assert_eq!(counter.stats().total, 0);

        plugin.start();
        counter.record_contact(true, DAY);
        counter.record_contact(true, DAY + 1);
        counter.record_contact(false, DAY + 2);
        counter.record_contact(true, DAY + 3);

        let stats = counter.stats();
        assert_eq!((stats.today, stats.total), (2, 2));

        plugin.stop();
        assert!(!counter.stats().running);
    }

    #[test]
    fn test_today_resets_on_new_day() {
        let counter = BoopCounter::new();
        let mut hooks = counter.clone();
        hooks.on_start(&SettingsMap::new());

        counter.record_contact(true, DAY);
        counter.record_contact(false, DAY);
        counter.record_contact(true, 2 * DAY + 5);

        let stats = counter.stats();
        assert_eq!((stats.today, stats.total), (1, 2));
    }

    #[test]
    fn test_announces_with_saved_settings() {
        let store = Arc::new(MemoryStore::new());
        store
            .save_data(
                "BoopCounter",
                "settings",
                json!({"chatbox": {"every": 2, "message": "{total} boops!"}}),
            )
            .unwrap();

        let counter = BoopCounter::new();
        let mut plugin = Plugin::new(descriptor().unwrap(), counter.clone(), gateways(store)).unwrap();
        plugin.start();

        assert_eq!(counter.record_contact(true, DAY), None);
        counter.record_contact(false, DAY);
        assert_eq!(counter.record_contact(true, DAY), Some("2 boops!".to_string()));
    }

    #[test]
    fn test_panel_edits_apply_on_next_start() {
        let store = Arc::new(MemoryStore::new());
        let counter = BoopCounter::new();
        let mut plugin = Plugin::new(descriptor().unwrap(), counter.clone(), gateways(store)).unwrap();
        plugin.start();

        let panel = plugin.show_settings_modal().unwrap();
        panel
            .widget(&SettingKey::top_level("announce"))
            .unwrap()
            .on_change
            .call(json!(false));
        panel.save();

        plugin.stop();
        plugin.start();

        for _ in 0..DEFAULT_EVERY {
            assert_eq!(counter.record_contact(true, DAY), None);
            counter.record_contact(false, DAY);
        }
        assert_eq!(counter.stats().total as u64, DEFAULT_EVERY);
    }
}
