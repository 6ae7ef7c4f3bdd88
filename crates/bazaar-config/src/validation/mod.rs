//! Full configuration validation.
//!
//! Validates numeric ranges and cross-field constraints. Each section has
//! its own submodule; this orchestrator calls them all and collects errors
//! into a single `ConfigError`.

mod helpers;
mod map;
mod presence;


use crate::schema::BazaarConfig;
use bazaar_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &BazaarConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    presence::validate_presence(&mut errors, config);
    map::validate_map(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
