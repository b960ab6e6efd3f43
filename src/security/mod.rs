pub mod jwt;

use thiserror::Error;

pub use jwt::TokenSigner;

/// Error surface for the signing helpers.
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("invalid key material for {0}")]
    InvalidKey(&'static str),
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("token signature mismatch")]
    SignatureMismatch,
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<base64::DecodeError> for SecurityError {
    fn from(err: base64::DecodeError) -> Self {
        SecurityError::Encoding(err.to_string())
    }
}

impl From<hmac::digest::InvalidLength> for SecurityError {
    fn from(_: hmac::digest::InvalidLength) -> Self {
        SecurityError::InvalidKey("HMAC key")
    }
}
