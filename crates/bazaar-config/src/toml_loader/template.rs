//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# UniBazaar Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[presence]
# heartbeat_interval_secs = 30   # 5-600
# online_window_secs = 300       # 30-86400, must exceed the heartbeat
# min_move_meters = 15.0         # 0-1000

[map]
# default_latitude = 49.2827
# default_longitude = -123.1207
# accuracy_circle_max_m = 500.0

[logging]
level = "INFO"                   # DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
