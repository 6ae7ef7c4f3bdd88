//! Log setup. The subscriber is installed before the config is read so the
//! loader's own messages are kept; the config's level is applied afterwards
//! unless `RUST_LOG` or `--log-level` already chose one.

use bazaar_config::schema::LogLevel;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

const DEFAULT_DIRECTIVE: &str = "info";

pub struct LogControl {
    handle: reload::Handle<EnvFilter, Registry>,
    /// Set when the filter came from the environment or the command line.
    pinned: bool,
}

/// Pick the start-up filter: `RUST_LOG`, then the flag, then the default.
/// Returns the directive and whether it was chosen explicitly.
fn startup_directive(env: Option<&str>, flag: Option<&str>) -> (String, bool) {
    match env.filter(|d| !d.trim().is_empty()).or(flag) {
        Some(directive) => (directive.to_string(), true),
        None => (DEFAULT_DIRECTIVE.to_string(), false),
    }
}

pub fn init(flag: Option<&str>) -> LogControl {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (directive, pinned) = startup_directive(env.as_deref(), flag);
    let (filter, rejected) = match EnvFilter::try_new(&directive) {
        Ok(filter) => (filter, false),
        Err(_) => (EnvFilter::new(DEFAULT_DIRECTIVE), true),
    };

    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    if rejected {
        tracing::warn!(directive = %directive, "Invalid log filter, using {DEFAULT_DIRECTIVE}");
    }
    LogControl { handle, pinned }
}

impl LogControl {
    /// Switch to the config's level unless the filter was chosen explicitly.
    pub fn apply_config_level(&self, level: LogLevel) {
        if self.pinned {
            return;
        }
        if let Err(e) = self.handle.reload(EnvFilter::new(level.as_filter())) {
            tracing::warn!(error = %e, "Failed to apply configured log level");
        }
    }
}
