use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use super::ConsentError;

/// Discriminates consent-state tokens from any other signed-token use.
pub const CONSENT_PURPOSE: &str = "admin_consent";

/// Payload embedded in the admin-consent `state` parameter.
///
/// Self-contained bearer state: once signed there is no server-side record,
/// and the token dies at its embedded expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentClaims {
    pub jti: String,
    pub iat: u64,
    pub exp: u64,
    pub purpose: String,
    #[serde(rename = "redirectUri")]
    pub redirect_uri: String,
}

impl ConsentClaims {
    pub fn new(redirect_uri: impl Into<String>, ttl: Duration) -> Self {
        let iat = current_epoch_seconds();
        Self {
            jti: fresh_jti(),
            iat,
            exp: iat.saturating_add(ttl.as_secs()),
            purpose: CONSENT_PURPOSE.to_string(),
            redirect_uri: redirect_uri.into(),
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.exp
    }

    pub fn has_consent_purpose(&self) -> bool {
        self.purpose == CONSENT_PURPOSE
    }
}

/// Which Azure AD tenant (or tenant class) an authorization request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantSelector(String);

impl TenantSelector {
    /// Accepts the `organizations`/`common` literals or a canonical
    /// 8-4-4-4-12 hex GUID; everything else is rejected before issuance.
    pub fn parse(raw: &str) -> Result<Self, ConsentError> {
        let trimmed = raw.trim();
        if trimmed == "organizations" || trimmed == "common" || is_canonical_guid(trimmed) {
            return Ok(Self(trimmed.to_string()));
        }
        Err(ConsentError::InvalidTenantSelector)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_canonical_guid(raw: &str) -> bool {
    let mut groups = raw.split('-');
    for expected_len in [8usize, 4, 4, 4, 12] {
        let Some(group) = groups.next() else {
            return false;
        };
        if group.len() != expected_len || !group.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }
    }
    groups.next().is_none()
}

fn fresh_jti() -> String {
    let mut entropy = [0u8; 16];
    OsRng.fill_bytes(&mut entropy);
    entropy.iter().map(|byte| format!("{byte:02x}")).collect()
}

pub fn current_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_and_guids_accepted() {
        assert!(TenantSelector::parse("organizations").is_ok());
        assert!(TenantSelector::parse("common").is_ok());
        for guid in [
            "72f988bf-86f1-41af-91ab-2d7cd011db47",
            "72F988BF-86F1-41AF-91AB-2D7CD011DB47",
            "00000000-0000-0000-0000-000000000000",
        ] {
            assert_eq!(TenantSelector::parse(guid).unwrap().as_str(), guid);
        }
    }

    #[test]
    fn non_canonical_selectors_rejected() {
        for raw in [
            "",
            "consumers",
            "ORGANIZATIONS",
            "72f988bf86f141af91ab2d7cd011db47",
            "72f988bf-86f1-41af-91ab-2d7cd011db4",
            "72f988bf-86f1-41af-91ab-2d7cd011db472",
            "{72f988bf-86f1-41af-91ab-2d7cd011db47}",
            "72f988bf-86f1-41af-91ab-2d7cd011dg47",
            "72f988bf-86f1-41af-91ab-2d7cd011db47-",
        ] {
            assert!(
                TenantSelector::parse(raw).is_err(),
                "`{raw}` should be rejected"
            );
        }
    }

    #[test]
    fn fresh_claims_carry_purpose_and_window() {
        let claims = ConsentClaims::new("https://chat.example.com/cb", Duration::from_secs(3600));
        assert!(claims.has_consent_purpose());
        assert_eq!(claims.exp, claims.iat + 3600);
        assert_eq!(claims.jti.len(), 32);
        assert!(claims.jti.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!claims.is_expired(claims.iat));
        assert!(claims.is_expired(claims.exp));
    }

    #[test]
    fn jti_is_unique_per_token() {
        let a = ConsentClaims::new("https://cb", Duration::from_secs(60));
        let b = ConsentClaims::new("https://cb", Duration::from_secs(60));
        assert_ne!(a.jti, b.jti);
    }
}
