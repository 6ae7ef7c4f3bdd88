//! Nearby-presence configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Presence heartbeat and staleness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceSettings {
    /// Seconds between heartbeat writes (valid range: 5-600).
    pub heartbeat_interval_secs: u32,
    /// A peer counts as online while its last report is younger than
    /// this many seconds (valid range: 30-86400).
    pub online_window_secs: u32,
    /// Position updates closer than this to the last reported fix wait
    /// for the next heartbeat instead of writing immediately.
    pub min_move_meters: f64,
}

impl PresenceSettings {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.heartbeat_interval_secs))
    }

    pub fn online_window(&self) -> Duration {
        Duration::from_secs(u64::from(self.online_window_secs))
    }
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 30,
            online_window_secs: 300,
            min_move_meters: 15.0,
        }
    }
}
