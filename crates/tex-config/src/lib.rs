//! tex-config
//!
//! Layered YAML configuration for the dashboard and its tools.
//!
//! - Later documents override earlier ones (deep merge of mappings).
//! - The merged document is rendered as canonical JSON and hashed with
//!   SHA-256, so two runs with the same effective config share a hash.
//! - Literal secrets are refused. Config stores environment variable NAMES;
//!   see [`secrets`].
//! - [`report_unused_keys`] flags leaves no setting reads.
//! - [`DashboardSettings`] is the typed view the dashboard consumes.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;

pub mod secrets;
mod settings;

pub use secrets::{resolve_service_credentials, ServiceCredentials};
pub use settings::{DashboardSettings, DefaultView, PersistencePolicy, ServiceSettings};

/// Prefixes of well-known credential formats. A leaf string starting with one
/// of these aborts loading with CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",
    "sk_live",
    "sk_test",
    "AKIA",
    "-----BEGIN",
    "ghp_",
    "gho_",
    "glpat-",
    "xoxb-",
    "xoxp-",
    "Bearer ",
    "eyJ", // JWT header
];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }
    let doc_refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for (i, raw) in yaml_docs.iter().enumerate() {
        let v_yaml: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml in layer {i}"))?;
        // An empty document parses as null; treat it as an empty layer.
        if v_yaml.is_null() {
            continue;
        }
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

/// Compact JSON. `serde_json::Map` is key-sorted (no `preserve_order`), so
/// key order in the YAML does not affect the output.
fn canonicalize_json(v: &Value) -> Result<String> {
    serde_json::to_string(v).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        if let Some(s) = v.pointer(&ptr).and_then(Value::as_str) {
            if looks_like_secret(s) {
                bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
            }
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

// ---------------------------------------------------------------------------
// Unused-key guard
// ---------------------------------------------------------------------------

/// Every leaf read by `DashboardSettings::from_config_json` and
/// `resolve_service_credentials`. Both roles read the same keys.
pub const CONSUMED_KEYS: &[&str] = &[
    "/dashboard/role",
    "/dashboard/default_view",
    "/dashboard/due_soon_days",
    "/persistence/max_attempts",
    "/persistence/retry_backoff_ms",
    "/service/base_url",
    "/service/token_env",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Leaves no setting reads, as JSON pointers, sorted.
    pub unused_keys: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_keys.is_empty()
    }
}

/// Leaves of `config_json` outside [`CONSUMED_KEYS`]. Typos such as
/// `due_son_days` would otherwise fall back to a default without notice.
///
/// # Errors
/// `CONFIG_UNUSED_KEYS` under [`UnusedKeyPolicy::Fail`] when any leaf is
/// unused.
pub fn report_unused_keys(
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let mut leaves = BTreeSet::new();
    leaf_keys(config_json, String::new(), &mut leaves);
    let unused_keys: Vec<String> = leaves
        .into_iter()
        .filter(|k| !CONSUMED_KEYS.contains(&k.as_str()))
        .collect();

    if policy == UnusedKeyPolicy::Fail && !unused_keys.is_empty() {
        bail!("CONFIG_UNUSED_KEYS: no setting reads {}", unused_keys.join(", "));
    }
    Ok(UnusedKeyReport { unused_keys })
}

/// Mappings are walked; anything else (scalars, sequences, empty maps) is
/// a leaf.
fn leaf_keys(v: &Value, path: String, out: &mut BTreeSet<String>) {
    match v {
        Value::Object(map) if !map.is_empty() => {
            for (k, child) in map {
                leaf_keys(child, format!("{path}/{k}"), out);
            }
        }
        _ if path.is_empty() => {}
        _ => {
            out.insert(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_stop_at_scalars_sequences_and_empty_maps() {
        let v = serde_json::json!({
            "service": {"base_url": "https://orders.example", "headers": ["a", "b"]},
            "dashboard": {},
        });
        let mut out = BTreeSet::new();
        leaf_keys(&v, String::new(), &mut out);
        let got: Vec<_> = out.into_iter().collect();
        assert_eq!(got, vec!["/dashboard", "/service/base_url", "/service/headers"]);
    }

    #[test]
    fn consumed_subtree_below_a_scalar_key_is_flagged() {
        let v = serde_json::json!({"dashboard": {"role": {"name": "brand"}}});
        let report = report_unused_keys(&v, UnusedKeyPolicy::Warn).unwrap();
        assert_eq!(report.unused_keys, vec!["/dashboard/role/name"]);
    }

    #[test]
    fn deep_merge_overrides_leaves_and_keeps_siblings() {
        let a = serde_json::json!({"dashboard": {"role": "brand", "due_soon_days": 3}});
        let b = serde_json::json!({"dashboard": {"due_soon_days": 5}});
        let m = deep_merge(a, b);
        assert_eq!(m.pointer("/dashboard/role").and_then(|v| v.as_str()), Some("brand"));
        assert_eq!(m.pointer("/dashboard/due_soon_days").and_then(|v| v.as_i64()), Some(5));
    }

    #[test]
    fn short_strings_are_never_secrets() {
        assert!(!looks_like_secret("sk-1"));
        assert!(looks_like_secret("ghp_0123456789abcdef"));
        assert!(!looks_like_secret("TEX_SERVICE_TOKEN"));
    }
}
