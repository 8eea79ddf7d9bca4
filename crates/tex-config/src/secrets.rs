//! Runtime secret resolution.
//!
//! # Contract
//! - Config stores only the NAME of the environment variable holding the
//!   order-service token (`/service/token_env`).
//! - Callers resolve once at startup and pass [`ServiceCredentials`] into
//!   whatever talks to the service.
//! - `Debug` redacts the token. Errors name the variable, never the value.

use anyhow::{bail, Result};

use crate::DashboardSettings;

#[derive(Clone)]
pub struct ServiceCredentials {
    pub base_url: Option<String>,
    pub token_env: String,
    pub token: Option<String>,
}

impl ServiceCredentials {
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("base_url", &self.base_url)
            .field("token_env", &self.token_env)
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// Unset or blank counts as absent.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve the service token named by `settings`.
///
/// When a `base_url` is configured the token is required: talking to a real
/// service without one would fail on every request.
///
/// # Errors
/// `SECRETS_MISSING` naming the variable when a remote service is configured
/// but the variable is unset or blank.
pub fn resolve_service_credentials(settings: &DashboardSettings) -> Result<ServiceCredentials> {
    let token_env = settings.service.token_env.clone();
    let token = resolve_env(&token_env);
    if settings.service.base_url.is_some() && token.is_none() {
        bail!(
            "SECRETS_MISSING: required env var '{}' (order service token) is not set or empty",
            token_env
        );
    }
    Ok(ServiceCredentials {
        base_url: settings.service.base_url.clone(),
        token_env,
        token,
    })
}
