//! Where the UniBazaar config lives, and writing the first one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bazaar_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

/// Directory under the OS config dir that holds UniBazaar settings.
pub const APP_DIR: &str = "unibazaar";
pub const CONFIG_FILE: &str = "config.toml";

/// `<os config dir>/unibazaar/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|base| config_path_in(&base))
        .ok_or_else(|| ConfigError::ParseError("no OS config directory for this user".into()))
}

/// The config file location under `base`.
pub fn config_path_in(base: &Path) -> PathBuf {
    base.join(APP_DIR).join(CONFIG_FILE)
}

/// Write the commented default config to `path`, creating parent dirs.
///
/// Never replaces an existing file.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let fail = |action: &str, e: io::Error| {
        ConfigError::ParseError(format!("cannot {action} {}: {e}", path.display()))
    };

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| fail("create directory for", e))?;
    }
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| fail("create", e))?;
    file.write_all(default_config_toml().as_bytes())
        .map_err(|e| fail("write", e))?;

    info!(path = %path.display(), "Wrote default config");
    Ok(())
}
