use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::config::AccessPolicy;

use super::UserProfile;

/// Development-only credential provider. Never constructed unless
/// `DEV_AUTH_ENABLED` is set; any username signs in as
/// `<username>@localhost`.
pub struct DevCredentialsProvider {
    policy: Arc<AccessPolicy>,
}

impl DevCredentialsProvider {
    pub fn new(policy: Arc<AccessPolicy>) -> Self {
        Self { policy }
    }

    pub fn authorize(&self, username: Option<&str>) -> UserProfile {
        let username = username
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("dev");
        let email = format!("{username}@localhost");
        let profile = UserProfile {
            id: hash_value(&email),
            name: username.to_string(),
            email: email.clone(),
            tenant_id: None,
            is_admin: self.policy.is_admin_email(&email),
            image: None,
        };
        tracing::info!(user = %profile.email, "dev user logged in");
        profile
    }
}

/// Stable opaque id for a value, SHA-256 hex.
pub fn hash_value(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    format!("{digest:x}")
}
