//! Scenario: unused-key guard
//!
//! # Invariant under test
//! Leaves no setting reads are reported, sorted, in WARN mode and are an
//! error in FAIL mode. Keys the settings read are never flagged, whichever
//! role the config selects.

use tex_config::{
    load_layered_yaml_from_strings, report_unused_keys, DashboardSettings, UnusedKeyPolicy,
};
use tex_status::Role;

const YAML: &str = r#"
dashboard:
  role: brand
  due_son_days: 2
  theme: dark
persistence:
  max_attempts: 2
legacy:
  zeta: 1
  alpha: 2
"#;

#[test]
fn warn_mode_reports_without_error() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");
    assert_eq!(
        report.unused_keys,
        vec![
            "/dashboard/due_son_days",
            "/dashboard/theme",
            "/legacy/alpha",
            "/legacy/zeta"
        ]
    );
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("CONFIG_UNUSED_KEYS"));
    assert!(msg.contains("/dashboard/due_son_days"));
}

#[test]
fn fully_consumed_config_is_clean_for_both_roles() {
    for role in Role::ALL {
        let yaml = format!(
            r#"
dashboard:
  role: {}
  default_view: list
  due_soon_days: 4
persistence:
  max_attempts: 3
  retry_backoff_ms: 250
service:
  base_url: "https://orders.example"
  token_env: TEX_SERVICE_TOKEN
"#,
            role.as_str().to_lowercase()
        );
        let loaded = load_layered_yaml_from_strings(&[yaml.as_str()]).unwrap();
        let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
        assert!(report.is_clean());

        let settings = DashboardSettings::from_config_json(&loaded.config_json).unwrap();
        assert_eq!(settings.role, role);
        assert_eq!(settings.due_soon_days, 4);
    }
}
