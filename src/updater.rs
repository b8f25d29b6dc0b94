use chrono::{DateTime, Local};
use log::{debug, info};
use parking_lot::Mutex;

use crate::gateway::UpdateGateway;

/// A request to look for a newer release of a plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCheck {
    pub plugin: String,
    pub version: String,
    pub source: String,
    pub requested_at: DateTime<Local>,
}

/// Collects update checks for the host to process on its own schedule.
///
/// Plugins never wait on the outcome.
#[derive(Debug)]
pub struct UpdateQueue {
    enabled: bool,
    pending: Mutex<Vec<UpdateCheck>>,
}

impl UpdateQueue {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub fn drain(&self) -> Vec<UpdateCheck> {
        std::mem::take(&mut *self.pending.lock())
    }
}

impl UpdateGateway for UpdateQueue {
    fn check_for_update(&self, plugin: &str, version: &str, update_source: Option<&str>) {
        if !self.enabled {
            return;
        }

        let Some(source) = update_source else {
            debug!("{} has no update source, skipping update check", plugin);
            return;
        };

        let mut pending = self.pending.lock();
        // One pending check per plugin is enough.
        pending.retain(|check| check.plugin != plugin);
        pending.push(UpdateCheck {
            plugin: plugin.to_string(),
            version: version.to_string(),
            source: source.to_string(),
            requested_at: Local::now(),
        });
        info!("Queued update check for {} v{}", plugin, version);
    }
}
