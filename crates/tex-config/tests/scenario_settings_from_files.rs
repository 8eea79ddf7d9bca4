//! Scenario: typed settings from layered files on disk
//!
//! # Invariant under test
//! `load_layered_yaml` reads files in the order given, and the typed view
//! sees the merged result with defaults for anything absent.

use std::fs;

use tex_config::{load_layered_yaml, DashboardSettings, DefaultView};
use tex_status::Role;

#[test]
fn later_files_override_earlier_ones() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let workshop = dir.path().join("workshop.yaml");
    fs::write(
        &base,
        "dashboard:\n  role: brand\n  default_view: board\npersistence:\n  retry_backoff_ms: 200\n",
    )
    .unwrap();
    fs::write(&workshop, "dashboard:\n  role: supplier\n  default_view: list\n").unwrap();

    let paths = [base.to_str().unwrap(), workshop.to_str().unwrap()];
    let loaded = load_layered_yaml(&paths).unwrap();
    let settings = DashboardSettings::from_config_json(&loaded.config_json).unwrap();

    assert_eq!(settings.role, Role::Supplier);
    assert_eq!(settings.default_view, DefaultView::List);
    assert_eq!(settings.persistence.retry_backoff_ms, 200);
    assert_eq!(settings.persistence.max_attempts, 3);
    assert_eq!(settings.due_soon_days, 3);
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    let err = load_layered_yaml(&[missing.to_str().unwrap()]).unwrap_err();
    assert!(err.to_string().contains("nope.yaml"));
}
