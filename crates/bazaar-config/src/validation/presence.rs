//! Validation for the `[presence]` section.

use crate::schema::BazaarConfig;

use super::helpers::{validate_range, validate_range_f64};

/// Validate heartbeat, staleness window and movement threshold.
pub(crate) fn validate_presence(errors: &mut Vec<String>, config: &BazaarConfig) {
    let presence = &config.presence;
    validate_range(
        errors,
        "presence.heartbeat_interval_secs",
        presence.heartbeat_interval_secs,
        5,
        600,
    );
    validate_range(
        errors,
        "presence.online_window_secs",
        presence.online_window_secs,
        30,
        86400,
    );
    validate_range_f64(
        errors,
        "presence.min_move_meters",
        presence.min_move_meters,
        0.0,
        1000.0,
    );

    // A window no longer than the heartbeat makes every peer flicker offline
    // between reports.
    if presence.online_window_secs <= presence.heartbeat_interval_secs {
        errors.push(format!(
            "presence.online_window_secs = {} must be greater than presence.heartbeat_interval_secs = {}",
            presence.online_window_secs, presence.heartbeat_interval_secs
        ));
    }
}
