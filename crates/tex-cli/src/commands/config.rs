//! `tex config-hash`.

use anyhow::Result;
use tex_config::{
    load_layered_yaml, report_unused_keys, resolve_service_credentials, DashboardSettings,
    UnusedKeyPolicy,
};

use super::parse_role;

pub fn config_hash(paths: Vec<String>, role: Option<String>, strict: bool) -> Result<()> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = load_layered_yaml(&path_refs)?;
    println!("config_hash={}", loaded.config_hash);
    println!("{}", loaded.canonical_json);

    let Some(role) = role else {
        return Ok(());
    };
    let role = parse_role(&role)?;

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;
    if !report.is_clean() {
        eprintln!("WARN: CONFIG_UNUSED_KEYS count={}", report.unused_keys.len());
        for key in &report.unused_keys {
            eprintln!("  unused={key}");
        }
    }

    let settings = DashboardSettings::from_config_json(&loaded.config_json)?;
    if settings.role != role {
        eprintln!(
            "WARN: config role {} differs from --role {}",
            settings.role, role
        );
    }
    let creds = resolve_service_credentials(&settings)?;

    println!("role={}", settings.role);
    println!("default_view={:?}", settings.default_view);
    println!("due_soon_days={}", settings.due_soon_days);
    println!(
        "persistence=max_attempts:{} retry_backoff_ms:{}",
        settings.persistence.max_attempts, settings.persistence.retry_backoff_ms
    );
    println!(
        "service_base_url={}",
        creds.base_url.as_deref().unwrap_or("")
    );
    println!("service_token_env={}", creds.token_env);
    println!("service_token_present={}", creds.has_token());
    Ok(())
}
