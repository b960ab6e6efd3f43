use std::sync::Arc;

use serde::Deserialize;

use crate::{config::AccessPolicy, security::TokenSigner};

use super::{fetch_profile_picture, AuthError, ProviderTokens, UserProfile};

const GRAPH_PHOTO_URL: &str = "https://graph.microsoft.com/v1.0/me/photos/48x48/$value";

/// Raw OIDC profile as the Azure AD provider hands it over.
#[derive(Debug, Clone, Deserialize)]
pub struct AzureProfile {
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub preferred_username: Option<String>,
    pub tid: Option<String>,
}

/// The slice of ID-token claims this service actually reads. The upstream
/// framework has already validated the token's signature; only the shape is
/// checked here.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    tid: Option<String>,
}

#[allow(dead_code)]
pub struct AzureAdProvider {
    client_id: String,
    client_secret: String,
    tenant_id: String,
    policy: Arc<AccessPolicy>,
    http: reqwest::Client,
    photo_url: String,
}

impl AzureAdProvider {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
        policy: Arc<AccessPolicy>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: tenant_id.into(),
            policy,
            http: reqwest::Client::new(),
            photo_url: GRAPH_PHOTO_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_photo_url(mut self, photo_url: impl Into<String>) -> Self {
        self.photo_url = photo_url.into();
        self
    }

    /// Map the provider profile into the common shape, resolving the tenant
    /// id from the ID token first and enforcing the tenant allowlist.
    pub async fn map_profile(
        &self,
        profile: &AzureProfile,
        tokens: &ProviderTokens,
    ) -> Result<UserProfile, AuthError> {
        let email = profile
            .email
            .as_deref()
            .or(profile.preferred_username.as_deref())
            .unwrap_or_default()
            .to_string();

        let tenant_id = resolve_tenant_id(profile, tokens);
        if let Some(tid) = tenant_id.as_deref() {
            if !self.policy.is_tenant_allowed(tid) {
                tracing::warn!(tenant = tid, "login blocked: tenant not allowed");
                return Err(AuthError::TenantNotAllowed(tid.to_string()));
            }
        }

        let image =
            fetch_profile_picture(&self.http, &self.photo_url, tokens.access_token.as_deref())
                .await;

        let is_admin = self.policy.is_admin_email(&email)
            || profile
                .preferred_username
                .as_deref()
                .map(|upn| self.policy.is_admin_email(upn))
                .unwrap_or(false);

        Ok(UserProfile {
            id: profile.sub.clone(),
            name: profile.name.clone().unwrap_or_else(|| email.clone()),
            email,
            tenant_id,
            is_admin,
            image,
        })
    }
}

/// Prefer the signed ID token's `tid` claim; fall back to the profile field.
fn resolve_tenant_id(profile: &AzureProfile, tokens: &ProviderTokens) -> Option<String> {
    if let Some(id_token) = tokens.id_token.as_deref() {
        match TokenSigner::decode_unverified::<IdTokenClaims>(id_token) {
            Ok(claims) => {
                if let Some(tid) = claims.tid {
                    return Some(tid.to_lowercase());
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to decode ID token");
            }
        }
    }
    profile.tid.as_deref().map(str::to_lowercase)
}
