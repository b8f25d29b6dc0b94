use chrono::{DateTime, Local};
use parking_lot::RwLock;

use crate::gateway::{ModalGateway, ModalOptions, RenderedElement};
use crate::plugin_api::Changelog;

#[derive(Clone, Debug, PartialEq)]
pub enum LogEntry {
    Info(String),
    Error(String),
    Modal {
        title: String,
        body: String,
        confirm_text: String,
    },
    Changelog {
        title: String,
        version: String,
        sections: usize,
        footer: Option<String>,
    },
}

#[derive(Clone, Debug)]
pub struct TimedEntry {
    pub at: DateTime<Local>,
    pub entry: LogEntry,
}

/// Bounded in-app log of host events and the dialogs plugins asked for.
pub struct ConsoleLog {
    enabled: bool,
    entries: Vec<TimedEntry>,
    max_entries: usize,
    /// Entries already handed out by `get_new_entries`.
    last_displayed_count: usize,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::with_max_entries(1000)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            enabled: true,
            entries: Vec::new(),
            max_entries: max_entries.max(1),
            last_displayed_count: 0,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn push(&mut self, entry: LogEntry) {
        if !self.enabled {
            return;
        }

        self.entries.push(TimedEntry {
            at: Local::now(),
            entry,
        });
        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
            self.last_displayed_count = self.last_displayed_count.saturating_sub(1);
        }
    }

    pub fn log_info(&mut self, message: &str) {
        self.push(LogEntry::Info(message.to_string()));
    }

    pub fn log_error(&mut self, message: &str) {
        self.push(LogEntry::Error(message.to_string()));
    }

    pub fn get_entries(&self) -> &[TimedEntry] {
        &self.entries
    }

    pub fn get_new_entries(&mut self) -> &[TimedEntry] {
        let new_entries = &self.entries[self.last_displayed_count..];
        self.last_displayed_count = self.entries.len();
        new_entries
    }

    /// Changelog dialogs shown so far, oldest first.
    pub fn changelogs(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries
            .iter()
            .map(|timed| &timed.entry)
            .filter(|entry| matches!(entry, LogEntry::Changelog { .. }))
    }

    pub fn modals(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries
            .iter()
            .map(|timed| &timed.entry)
            .filter(|entry| matches!(entry, LogEntry::Modal { .. }))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_displayed_count = 0;
    }
}

impl Default for ConsoleLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalGateway for RwLock<ConsoleLog> {
    fn show_modal(&self, title: &str, content: RenderedElement, options: ModalOptions) {
        self.write().push(LogEntry::Modal {
            title: title.to_string(),
            body: content.0,
            confirm_text: options.confirm_text,
        });
    }

    fn show_changelog_modal(
        &self,
        title: &str,
        version: &str,
        changelog: &Changelog,
        footer: Option<&str>,
    ) {
        self.write().push(LogEntry::Changelog {
            title: title.to_string(),
            version: version.to_string(),
            sections: changelog.sections.len(),
            footer: footer.map(str::to_string),
        });
    }
}

/// One line per entry, as printed by the host.
pub fn format_entry(entry: &LogEntry) -> String {
    match entry {
        LogEntry::Info(msg) => format!("ℹ {}", msg),
        LogEntry::Error(msg) => format!("✗ {}", msg),
        LogEntry::Modal { title, body, .. } => format!("▣ {}\n{}", title, body.trim_end()),
        LogEntry::Changelog {
            title,
            version,
            sections,
            ..
        } => format!("★ {} (v{}, {} section(s))", title, version, sections),
    }
}
