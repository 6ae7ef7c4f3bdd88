//! Validation for the `[map]` section.

use crate::schema::BazaarConfig;

use super::helpers::validate_range_f64;

pub(crate) fn validate_map(errors: &mut Vec<String>, config: &BazaarConfig) {
    validate_range_f64(
        errors,
        "map.default_latitude",
        config.map.default_latitude,
        -90.0,
        90.0,
    );
    validate_range_f64(
        errors,
        "map.default_longitude",
        config.map.default_longitude,
        -180.0,
        180.0,
    );
    validate_range_f64(
        errors,
        "map.accuracy_circle_max_m",
        config.map.accuracy_circle_max_m,
        0.0,
        100_000.0,
    );
}
