pub mod issuer;
pub mod state;
pub mod verifier;

use thiserror::Error;

pub use issuer::ConsentUrlIssuer;
pub use state::{ConsentClaims, TenantSelector, CONSENT_PURPOSE};
pub use verifier::{evaluate_callback, CallbackParams, ConsentOutcome};

use crate::{config::ConfigError, secrets::SecretError, security::SecurityError};

#[derive(Debug, Error)]
pub enum ConsentError {
    #[error("tenant selector must be `organizations`, `common`, or a tenant GUID")]
    InvalidTenantSelector,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Secret(#[from] SecretError),
    #[error(transparent)]
    Security(#[from] SecurityError),
}
