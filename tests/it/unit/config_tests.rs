//! Unit tests for the config module.

use cardboard::config::{BoardConfig, ConfigWatcher, RelaySpec, default_config_path};
use cardboard::constants::{DEFAULT_DAMPING_THRESHOLD, LINK_DAMPING_THRESHOLD, STREAM_BATCH_SIZE};
use cardboard::error::ConfigError;
use cardboard::types::CardKind;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_defaults_match_constants() {
    let config = BoardConfig::default();
    assert_eq!(config.batch_size, STREAM_BATCH_SIZE);
    assert_eq!(config.damping_for(CardKind::LinkPreview), LINK_DAMPING_THRESHOLD);
    assert_eq!(config.damping_for(CardKind::PdfDocument), DEFAULT_DAMPING_THRESHOLD);
    assert_eq!(config.relay_timeout().as_millis(), 5_000);
}

#[test]
fn test_save_then_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let config = BoardConfig {
        batch_size: 25,
        relays: vec![RelaySpec::json("https://relay.test/get?url={url}")],
        ..BoardConfig::default()
    };
    config.save_to(&path).unwrap();

    let loaded = BoardConfig::load_from(&path).unwrap();
    assert_eq!(loaded.batch_size, 25);
    assert_eq!(loaded.relays.len(), 1);
    assert!(loaded.relays[0].json_contents);
}

#[test]
fn test_malformed_file_is_json_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(BoardConfig::load_from(&path), Err(ConfigError::Json(_))));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        BoardConfig::load_from(&dir.path().join("absent.json")),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_watcher_creation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{}").unwrap();

    let mut watcher = ConfigWatcher::new(path).unwrap();
    // Nothing has changed yet
    let _ = watcher.poll();
}

#[test]
fn test_default_path_is_namespaced() {
    match default_config_path() {
        Ok(path) => assert!(path.ends_with("cardboard/config.json")),
        Err(e) => assert!(matches!(e, ConfigError::NoConfigDir)),
    }
}

#[test]
fn test_inverted_zoom_range_is_swapped_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{"min_zoom": 2.0, "max_zoom": 1.0, "batch_size": 0, "camera_padding": -5.0,
            "relays": [{"template": "https://relay.test/static"}, {"template": "https://relay.test/?q={url}"}]}"#,
    )
    .unwrap();

    let config = BoardConfig::load_from(&path).unwrap();
    assert_eq!((config.min_zoom, config.max_zoom), (1.0, 2.0));
    assert_eq!(config.batch_size, STREAM_BATCH_SIZE);
    assert_eq!(config.camera_padding, BoardConfig::default().camera_padding);
    assert_eq!(config.relays, vec![RelaySpec::new("https://relay.test/?q={url}")]);
}

#[test]
fn test_non_finite_zoom_falls_back_to_defaults() {
    let defaults = BoardConfig::default();
    let config = BoardConfig {
        min_zoom: f32::NAN,
        max_zoom: 0.0,
        ..BoardConfig::default()
    }
    .normalized();
    assert_eq!((config.min_zoom, config.max_zoom), (defaults.min_zoom, defaults.max_zoom));
}
