//! Reading a config file into `BazaarConfig`.

use std::fs;
use std::io;
use std::path::Path;

use bazaar_common::ConfigError;
use tracing::{debug, warn};

use super::paths::{create_default_config, default_config_path};
use crate::schema::BazaarConfig;
use crate::validation;

/// Parse TOML text. Sections and keys that are absent keep their defaults.
pub fn parse_config(content: &str) -> Result<BazaarConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load the config at `path`.
///
/// Out-of-range values are logged and the parsed config is returned
/// anyway; `load_config_from` is the strict variant.
pub fn load_from_path(path: &Path) -> Result<BazaarConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "cannot read {}: {e}",
                path.display()
            )))
        }
    };

    let config = parse_config(&content).map_err(|e| match e {
        ConfigError::ParseError(msg) => ConfigError::ParseError(format!("{}: {msg}", path.display())),
        other => other,
    })?;

    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), error = %e, "Config has out-of-range values");
    }
    debug!(
        path = %path.display(),
        heartbeat_secs = config.presence.heartbeat_interval_secs,
        online_window_secs = config.presence.online_window_secs,
        "Loaded config"
    );
    Ok(config)
}

/// Load `path`, writing the default template there first if it is missing.
pub fn load_or_create(path: &Path) -> Result<BazaarConfig, ConfigError> {
    match load_from_path(path) {
        Err(ConfigError::FileNotFound(_)) => {
            create_default_config(path)?;
            Ok(BazaarConfig::default())
        }
        other => other,
    }
}

/// Load from `<os config dir>/unibazaar/config.toml`, creating it on first
/// run.
pub fn load_default() -> Result<BazaarConfig, ConfigError> {
    load_or_create(&default_config_path()?)
}
