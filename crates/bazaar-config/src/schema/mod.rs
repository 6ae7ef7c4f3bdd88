//! Configuration schema types for UniBazaar.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod map;
mod presence;
mod system;

pub use map::*;
pub use presence::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct BazaarConfig {
    pub presence: PresenceSettings,
    pub map: MapConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_presence_settings() {
        let config = BazaarConfig::default();
        assert_eq!(config.presence.heartbeat_interval_secs, 30);
        assert_eq!(config.presence.online_window_secs, 300);
        assert_eq!(config.presence.min_move_meters, 15.0);
        assert_eq!(config.presence.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(config.presence.online_window(), Duration::from_secs(300));
    }

    #[test]
    fn default_map_centers_on_vancouver() {
        let config = BazaarConfig::default();
        assert_eq!(config.map.default_latitude, 49.2827);
        assert_eq!(config.map.default_longitude, -123.1207);
        assert_eq!(config.map.accuracy_circle_max_m, 500.0);
    }

    #[test]
    fn default_logging_is_info() {
        let config = BazaarConfig::default();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.level.as_filter(), "info");
    }

    #[test]
    fn log_level_parses_uppercase() {
        let config: BazaarConfig = toml::from_str("[logging]\nlevel = \"WARNING\"\n").unwrap();
        assert_eq!(config.logging.level, LogLevel::Warning);
        assert_eq!(config.logging.level.as_filter(), "warn");
    }

    #[test]
    fn partial_presence_section_keeps_other_defaults() {
        let config: BazaarConfig =
            toml::from_str("[presence]\nonline_window_secs = 120\n").unwrap();
        assert_eq!(config.presence.online_window_secs, 120);
        assert_eq!(config.presence.heartbeat_interval_secs, 30);
        assert_eq!(config.map.default_latitude, 49.2827);
    }

    #[test]
    fn empty_toml_is_default() {
        let config: BazaarConfig = toml::from_str("").unwrap();
        assert_eq!(config.presence.heartbeat_interval_secs, 30);
        assert_eq!(config.logging.level, LogLevel::Info);
    }
}
