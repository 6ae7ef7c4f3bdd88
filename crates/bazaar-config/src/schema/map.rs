//! Map defaults used before the first location fix arrives.

use serde::{Deserialize, Serialize};

/// Map configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub default_latitude: f64,
    pub default_longitude: f64,
    /// Accuracy circles are only drawn for fixes better than this.
    pub accuracy_circle_max_m: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_latitude: 49.2827,
            default_longitude: -123.1207,
            accuracy_circle_max_m: 500.0,
        }
    }
}
