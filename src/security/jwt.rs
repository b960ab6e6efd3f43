use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;

use super::SecurityError;

type HmacSha256 = Hmac<Sha256>;

// base64url of {"alg":"HS256","typ":"JWT"}
const PROTECTED_HEADER_B64: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";

/// Compact-JWT signer/verifier backed by the process-wide HS256 secret.
///
/// Signature and structure checks live here; claim-level checks (expiry,
/// purpose) belong to the caller, which knows the claim shape.
#[derive(Clone)]
pub struct TokenSigner {
    key: Vec<u8>,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(key: &[u8]) -> Result<Self, SecurityError> {
        if key.is_empty() {
            return Err(SecurityError::InvalidKey(
                "STATE_SIGNING_SECRET (must not be empty)",
            ));
        }
        Ok(Self { key: key.to_vec() })
    }

    /// Produce a compact JWS string for the provided claims.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, SecurityError> {
        let payload = serde_json::to_vec(claims)?;
        let payload_b64 = URL_SAFE_NO_PAD.encode(payload);
        let signing_input = format!("{PROTECTED_HEADER_B64}.{payload_b64}");
        let mut mac = HmacSha256::new_from_slice(&self.key)?;
        mac.update(signing_input.as_bytes());
        let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Parse and verify a compact JWS string, yielding the embedded claims.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, SecurityError> {
        let mut segments = token.split('.');
        let header = segments
            .next()
            .ok_or_else(|| SecurityError::Encoding("JWT missing header segment".to_string()))?;
        let payload = segments
            .next()
            .ok_or_else(|| SecurityError::Encoding("JWT missing payload segment".to_string()))?;
        let signature = segments
            .next()
            .ok_or_else(|| SecurityError::Encoding("JWT missing signature segment".to_string()))?;

        if segments.next().is_some() {
            return Err(SecurityError::Encoding(
                "JWT contained unexpected trailing segments".to_string(),
            ));
        }

        if header != PROTECTED_HEADER_B64 {
            return Err(SecurityError::Encoding(
                "JWT header does not match expected HS256 header".to_string(),
            ));
        }

        let signature_bytes = URL_SAFE_NO_PAD.decode(signature.as_bytes())?;
        let signing_input = format!("{header}.{payload}");
        let mut mac = HmacSha256::new_from_slice(&self.key)?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature_bytes)
            .map_err(|_| SecurityError::SignatureMismatch)?;

        let payload_bytes = URL_SAFE_NO_PAD.decode(payload.as_bytes())?;
        Ok(serde_json::from_slice(&payload_bytes)?)
    }

    /// Decode a compact JWT payload without verifying its signature.
    ///
    /// For claims issued by a third party whose signature is checked
    /// upstream (identity-provider ID tokens).
    pub fn decode_unverified<T: DeserializeOwned>(token: &str) -> Result<T, SecurityError> {
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| SecurityError::Encoding("JWT missing payload segment".to_string()))?;
        let payload_bytes = URL_SAFE_NO_PAD.decode(payload.as_bytes())?;
        Ok(serde_json::from_slice(&payload_bytes)?)
    }
}
