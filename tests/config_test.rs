//! Integration tests for Settings file loading.
//!
//! These tests only write temp files; they assume no STAGETREE_* variables
//! are set in the test environment.

use std::fs;

use tempfile::TempDir;

use stagetree::config::Settings;
use stagetree::infrastructure::InfraError;

#[test]
fn given_config_file_when_load_then_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stagetree.toml");
    fs::write(
        &path,
        r#"
user = "operator"
log_level = "info"

[session]
prune_empty_parents = true
"#,
    )
    .unwrap();

    let settings = Settings::load(Some(&path)).expect("load settings");

    assert_eq!(settings.user, "operator");
    assert_eq!(settings.log_level, "info");
    assert!(settings.session.prune_empty_parents);
    assert!(settings.session_options().prune_empty_parents);
}

#[test]
fn given_partial_config_file_when_load_then_missing_keys_use_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.toml");
    fs::write(&path, "[session]\nprune_empty_parents = true\n").unwrap();

    let settings = Settings::load(Some(&path)).expect("load settings");

    assert_eq!(settings.user, Settings::default().user);
    assert!(settings.session.prune_empty_parents);
}

#[test]
fn given_missing_config_file_when_load_then_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = Settings::load(Some(&path)).unwrap_err();

    assert!(matches!(err, InfraError::Io { .. }), "{err}");
}

#[test]
fn given_malformed_config_file_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "log_level = [").unwrap();

    let err = Settings::load(Some(&path)).unwrap_err();

    assert!(matches!(err, InfraError::Config { .. }), "{err}");
}

#[test]
fn given_settings_when_to_toml_then_round_trips_through_file() {
    let settings = Settings {
        user: "operator".into(),
        log_level: "trace".into(),
        ..Settings::default()
    };
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dump.toml");
    fs::write(&path, settings.to_toml().unwrap()).unwrap();

    let loaded = Settings::load(Some(&path)).unwrap();

    assert_eq!(loaded, settings);
}
