use std::{env, time::Duration};

use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Static configuration for the admin-consent flow.
#[derive(Debug, Clone)]
pub struct ConsentSettings {
    /// Authorization host, `login.microsoftonline.com` unless overridden.
    pub authority: String,
    pub client_id: String,
    /// The redirect URI registered for the consent callback.
    pub callback_url: String,
    pub success_redirect: Url,
    pub failure_redirect: Url,
    pub default_ttl: Duration,
}

impl ConsentSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let authority = env::var("ADMIN_CONSENT_AUTHORITY")
            .unwrap_or_else(|_| "login.microsoftonline.com".to_string());
        let client_id = require_env("AZURE_AD_CLIENT_ID")?;
        let callback_url = require_env("ADMIN_CONSENT_CALLBACK_URL")?;
        let success_redirect = require_redirect_env("ADMIN_CONSENT_SUCCESS_REDIRECT")?;
        let failure_redirect = require_redirect_env("ADMIN_CONSENT_FAILURE_REDIRECT")?;
        let default_ttl = match env::var("ADMIN_CONSENT_DEFAULT_TTL") {
            Ok(raw) => parse_ttl(&raw)?,
            Err(_) => Duration::from_secs(24 * 3600),
        };

        Ok(Self {
            authority,
            client_id,
            callback_url,
            success_redirect,
            failure_redirect,
            default_ttl,
        })
    }
}

/// Admin and tenant allowlists shared by the identity providers and the
/// reporting gate.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    admin_emails: Vec<String>,
    allowed_tenants: Vec<String>,
}

impl AccessPolicy {
    pub fn from_env() -> Self {
        Self {
            admin_emails: parse_csv(env::var("ADMIN_EMAIL_ADDRESSES").ok().as_deref()),
            allowed_tenants: parse_csv(env::var("ALLOWED_TENANT_IDS").ok().as_deref()),
        }
    }

    pub fn from_lists(admin_emails: Vec<String>, allowed_tenants: Vec<String>) -> Self {
        Self {
            admin_emails: admin_emails
                .into_iter()
                .map(|e| e.trim().to_lowercase())
                .collect(),
            allowed_tenants: allowed_tenants
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .collect(),
        }
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let needle = email.trim().to_lowercase();
        !needle.is_empty() && self.admin_emails.iter().any(|e| e == &needle)
    }

    /// An empty allowlist admits every tenant.
    pub fn is_tenant_allowed(&self, tenant_id: &str) -> bool {
        if self.allowed_tenants.is_empty() {
            return true;
        }
        let needle = tenant_id.trim().to_lowercase();
        self.allowed_tenants.iter().any(|t| t == &needle)
    }
}

fn require_env(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv(key)),
    }
}

fn require_redirect_env(key: &'static str) -> Result<Url, ConfigError> {
    let raw = require_env(key)?;
    Url::parse(&raw)
        .map_err(|_| ConfigError::InvalidConfig(format!("{key} must be an absolute URL: `{raw}`")))
}

fn parse_csv(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Parse a duration string of the form `<n>`, `<n>s`, `<n>m`, `<n>h`, `<n>d`.
pub fn parse_ttl(raw: &str) -> Result<Duration, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "expiry duration must not be empty".to_string(),
        ));
    }

    let (digits, multiplier) = match trimmed.char_indices().last() {
        Some((idx, 's')) => (&trimmed[..idx], 1),
        Some((idx, 'm')) => (&trimmed[..idx], 60),
        Some((idx, 'h')) => (&trimmed[..idx], 3600),
        Some((idx, 'd')) => (&trimmed[..idx], 86_400),
        _ => (trimmed, 1),
    };

    let value: u64 = digits.parse().map_err(|_| {
        ConfigError::InvalidConfig(format!("invalid expiry duration `{trimmed}`"))
    })?;
    if value == 0 {
        return Err(ConfigError::InvalidConfig(format!(
            "expiry duration `{trimmed}` must be positive"
        )));
    }

    Ok(Duration::from_secs(value * multiplier))
}
