use serde::Deserialize;

use crate::security::TokenSigner;

use super::state::ConsentClaims;

/// Query parameters Azure sends back to the consent callback.
///
/// Both historical spellings of the grant flag and both tenant keys are
/// accepted.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CallbackParams {
    pub state: Option<String>,
    pub tenant: Option<String>,
    pub tid: Option<String>,
    pub admin_consent: Option<String>,
    pub admin_consented: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    fn tenant_id(&self) -> String {
        self.tenant
            .as_deref()
            .or(self.tid.as_deref())
            .unwrap_or_default()
            .to_string()
    }

    fn granted(&self) -> bool {
        self.admin_consent
            .as_deref()
            .or(self.admin_consented.as_deref())
            .map(|flag| flag.eq_ignore_ascii_case("true") || flag.eq_ignore_ascii_case("yes"))
            .unwrap_or(false)
    }
}

/// Terminal classification of one callback; the HTTP layer turns each
/// variant into a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentOutcome {
    Success { tenant: String },
    Failure { reason: String },
}

impl ConsentOutcome {
    fn failure(reason: impl Into<String>) -> Self {
        ConsentOutcome::Failure {
            reason: reason.into(),
        }
    }
}

/// Single-pass verification of a consent callback.
///
/// Never raises for an expected failure; every branch lands on a classified
/// outcome. Checks run in a fixed order: state presence, then signature and
/// expiry, then purpose, then the authorization server's own verdict.
pub fn evaluate_callback(
    params: &CallbackParams,
    signer: &TokenSigner,
    now: u64,
) -> ConsentOutcome {
    let Some(state) = params.state.as_deref() else {
        return ConsentOutcome::failure("missing_state");
    };

    let claims: ConsentClaims = match signer.verify(state) {
        Ok(claims) => claims,
        Err(_) => return ConsentOutcome::failure("invalid_state"),
    };
    if claims.is_expired(now) {
        return ConsentOutcome::failure("invalid_state");
    }
    if !claims.has_consent_purpose() {
        return ConsentOutcome::failure("bad_purpose");
    }

    if let Some(error) = params.error.as_deref().filter(|e| !e.is_empty()) {
        let reason = params
            .error_description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(error);
        return ConsentOutcome::failure(reason);
    }

    if params.granted() {
        return ConsentOutcome::Success {
            tenant: params.tenant_id(),
        };
    }

    ConsentOutcome::failure("unknown_response")
}
