use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    consent::state::current_epoch_seconds,
    providers::UserProfile,
    security::TokenSigner,
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session token is missing or malformed")]
    Invalid,
    #[error("session token has expired")]
    Expired,
}

/// Bearer-session claims minted by the external auth layer and verified
/// here. Signed with the same process-wide secret as the consent state, so
/// both sides of the deployment agree without extra key exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "tenantId", skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
    pub iat: u64,
    pub exp: u64,
}

impl SessionClaims {
    pub fn for_profile(profile: &UserProfile, ttl: Duration) -> Self {
        let iat = current_epoch_seconds();
        Self {
            sub: profile.id.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            tenant_id: profile.tenant_id.clone(),
            is_admin: profile.is_admin,
            iat,
            exp: iat.saturating_add(ttl.as_secs()),
        }
    }

    /// Verify a bearer token against the shared signer, including expiry.
    pub fn verify(signer: &TokenSigner, token: &str, now: u64) -> Result<Self, SessionError> {
        let claims: SessionClaims = signer.verify(token).map_err(|_| SessionError::Invalid)?;
        if now >= claims.exp {
            return Err(SessionError::Expired);
        }
        Ok(claims)
    }
}
