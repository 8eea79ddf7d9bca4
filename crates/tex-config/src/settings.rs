use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tex_status::Role;

/// Which layout the dashboard opens in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefaultView {
    #[default]
    Board,
    List,
}

impl DefaultView {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "board" | "kanban" => Some(DefaultView::Board),
            "list" | "lista" => Some(DefaultView::List),
            _ => None,
        }
    }
}

/// Retry policy for persisting optimistic status changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistencePolicy {
    /// Total attempts per request, first try included. Always >= 1.
    pub max_attempts: u32,
    /// Delay before attempt `n + 1` is `retry_backoff_ms * n`.
    pub retry_backoff_ms: u64,
}

impl Default for PersistencePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    pub base_url: Option<String>,
    /// NAME of the environment variable holding the service token.
    pub token_env: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            token_env: "TEX_SERVICE_TOKEN".to_string(),
        }
    }
}

/// Typed view over the merged config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSettings {
    pub role: Role,
    pub default_view: DefaultView,
    pub due_soon_days: i64,
    pub persistence: PersistencePolicy,
    pub service: ServiceSettings,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            role: Role::Brand,
            default_view: DefaultView::Board,
            due_soon_days: 3,
            persistence: PersistencePolicy::default(),
            service: ServiceSettings::default(),
        }
    }
}

impl DashboardSettings {
    /// Read settings from `config_json`. Absent keys take defaults; present
    /// keys of the wrong type or out of range are errors.
    pub fn from_config_json(config_json: &Value) -> Result<Self> {
        let mut out = Self::default();

        if let Some(raw) = read_str(config_json, "/dashboard/role")? {
            out.role = match raw.parse::<Role>() {
                Ok(role) => role,
                Err(e) => bail!("CONFIG_INVALID /dashboard/role: {e}"),
            };
        }
        if let Some(raw) = read_str(config_json, "/dashboard/default_view")? {
            out.default_view = match DefaultView::parse(&raw) {
                Some(v) => v,
                None => bail!("CONFIG_INVALID /dashboard/default_view: '{raw}' (expected board|list)"),
            };
        }
        if let Some(days) = read_i64(config_json, "/dashboard/due_soon_days")? {
            if days < 0 {
                bail!("CONFIG_INVALID /dashboard/due_soon_days: must be >= 0, got {days}");
            }
            out.due_soon_days = days;
        }
        if let Some(n) = read_i64(config_json, "/persistence/max_attempts")? {
            if !(1..=i64::from(u32::MAX)).contains(&n) {
                bail!("CONFIG_INVALID /persistence/max_attempts: must be >= 1, got {n}");
            }
            out.persistence.max_attempts = n as u32;
        }
        if let Some(ms) = read_i64(config_json, "/persistence/retry_backoff_ms")? {
            if ms < 0 {
                bail!("CONFIG_INVALID /persistence/retry_backoff_ms: must be >= 0, got {ms}");
            }
            out.persistence.retry_backoff_ms = ms as u64;
        }
        out.service.base_url = read_str(config_json, "/service/base_url")?;
        if let Some(name) = read_str(config_json, "/service/token_env")? {
            out.service.token_env = name;
        }

        Ok(out)
    }
}

/// Trimmed non-empty string at `pointer`; `None` when absent, null or blank.
fn read_str(config: &Value, pointer: &str) -> Result<Option<String>> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let t = s.trim();
            Ok((!t.is_empty()).then(|| t.to_string()))
        }
        Some(other) => bail!("CONFIG_INVALID {pointer}: expected string, got {other}"),
    }
}

fn read_i64(config: &Value, pointer: &str) -> Result<Option<i64>> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_i64() {
            Some(n) => Ok(Some(n)),
            None => bail!("CONFIG_INVALID {pointer}: expected integer, got {v}"),
        },
    }
}
