//! Configuration and state types for the presence tracker.

use std::time::Duration;

/// How often the current position is re-reported while active.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// A peer is online while its last report is younger than this.
pub const ONLINE_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Moves shorter than this wait for the next heartbeat.
pub const MIN_MOVE_METERS: f64 = 15.0;

/// Configuration for a presence tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub heartbeat_interval: Duration,
    pub online_window: Duration,
    pub min_move_meters: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: HEARTBEAT_INTERVAL,
            online_window: ONLINE_WINDOW,
            min_move_meters: MIN_MOVE_METERS,
        }
    }
}

/// Lifecycle of a tracking session.
///
/// `Stopped -> Starting` on `start_tracking`, `Starting -> Active` once the
/// first fix arrives, and back to `Stopped` on `stop_tracking` or a failed
/// first fix. Individual write failures never change the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerState {
    #[default]
    Stopped,
    Starting,
    Active,
}
