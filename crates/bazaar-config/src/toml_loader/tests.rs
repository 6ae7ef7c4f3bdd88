//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_unibazaar_config.toml"));
    let err = result.unwrap_err();
    assert!(matches!(err, bazaar_common::ConfigError::FileNotFound(_)));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[presence]
heartbeat_interval_secs = 10

[logging]
level = "DEBUG"
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.presence.heartbeat_interval_secs, 10);
    assert_eq!(config.logging.level, crate::schema::LogLevel::Debug);
    // Defaults preserved
    assert_eq!(config.presence.online_window_secs, 300);
    assert_eq!(config.map.default_longitude, -123.1207);
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, bazaar_common::ConfigError::ParseError(_)));
}

#[test]
fn load_config_with_invalid_values_is_returned_as_is() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[presence]
heartbeat_interval_secs = 1
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.presence.heartbeat_interval_secs, 1);
}

#[test]
fn create_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unibazaar").join("config.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.presence.heartbeat_interval_secs, 30);
    assert_eq!(config.presence.online_window_secs, 300);
}

#[test]
fn default_config_toml_is_valid() {
    use super::template::default_config_toml;
    use crate::schema::BazaarConfig;

    let content = default_config_toml();
    let config: BazaarConfig = toml::from_str(&content).unwrap();
    assert!(crate::validation::validate(&config).is_ok());
}

#[test]
fn default_config_path_is_reasonable() {
    // Not every CI environment has a config dir.
    if let Ok(path) = default_config_path() {
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("unibazaar"));
        assert!(path_str.ends_with("config.toml"));
    }
}

#[test]
fn empty_text_parses_to_defaults() {
    let config = parse_config("").unwrap();
    assert_eq!(config.presence.heartbeat_interval_secs, 30);
    assert_eq!(config.map.accuracy_circle_max_m, 500.0);
}

#[test]
fn parse_error_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[presence\n").unwrap();

    match load_from_path(&path).unwrap_err() {
        bazaar_common::ConfigError::ParseError(msg) => {
            assert!(msg.contains("config.toml"), "got {msg}");
        }
        other => panic!("expected ParseError, got {other:?}"),
    }
}

#[test]
fn load_or_create_writes_template_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = config_path_in(dir.path());
    assert!(!path.exists());

    let first = load_or_create(&path).unwrap();
    assert!(path.exists());
    assert_eq!(first.presence.online_window_secs, 300);

    // A user edit survives the next load.
    std::fs::write(&path, "[presence]\nmin_move_meters = 40.0\n").unwrap();
    let second = load_or_create(&path).unwrap();
    assert_eq!(second.presence.min_move_meters, 40.0);
}

#[test]
fn create_default_config_never_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[map]\ndefault_latitude = 1.0\n").unwrap();

    assert!(create_default_config(&path).is_err());
    let config = load_from_path(&path).unwrap();
    assert_eq!(config.map.default_latitude, 1.0);
}

#[test]
fn config_path_in_uses_app_dir() {
    let path = config_path_in(Path::new("/base"));
    assert_eq!(path, Path::new("/base").join(APP_DIR).join(CONFIG_FILE));
}
