use std::env;

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::OnceCell;
use url::Url;

use crate::security::{SecurityError, TokenSigner};

const SECRET_ENV: &str = "STATE_SIGNING_SECRET";
const VAULT_API_VERSION: &str = "7.4";

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),
    #[error("invalid secret store reference: {0}")]
    InvalidReference(String),
    #[error("secret store request failed: {0}")]
    Vault(String),
    #[error("resolved secret is unusable: {0}")]
    InvalidSecret(#[from] SecurityError),
}

/// Where the signing secret comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SecretSource {
    Direct(String),
    VaultReference {
        vault_name: String,
        secret_name: String,
    },
}

/// Resolves the process-wide state-signing secret at most once.
///
/// The raw environment value is either the secret itself or a Key Vault
/// reference (`VaultName=<v>;SecretName=<s>`, optionally wrapped in
/// `@Microsoft.KeyVault(...)`). The resolved signer is held in a
/// single-initialization cell; later callers reuse it without touching the
/// store again.
pub struct SecretProvider {
    source: SecretSource,
    vault_base: Option<String>,
    access_token: Option<String>,
    http: reqwest::Client,
    signer: OnceCell<TokenSigner>,
}

impl SecretProvider {
    pub fn from_env() -> Result<Self, SecretError> {
        let raw = match env::var(SECRET_ENV) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => return Err(SecretError::MissingEnv(SECRET_ENV)),
        };
        let source = parse_source(&raw)?;
        Ok(Self {
            source,
            vault_base: env::var("KEY_VAULT_BASE_URL").ok(),
            access_token: env::var("KEY_VAULT_ACCESS_TOKEN").ok(),
            http: reqwest::Client::new(),
            signer: OnceCell::new(),
        })
    }

    /// A provider holding the secret verbatim, bypassing the environment.
    pub fn direct(secret: impl Into<String>) -> Self {
        Self {
            source: SecretSource::Direct(secret.into()),
            vault_base: None,
            access_token: None,
            http: reqwest::Client::new(),
            signer: OnceCell::new(),
        }
    }

    /// A provider that fetches from a secret store rooted at `vault_base`.
    pub fn vault(
        vault_name: impl Into<String>,
        secret_name: impl Into<String>,
        vault_base: Option<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            source: SecretSource::VaultReference {
                vault_name: vault_name.into(),
                secret_name: secret_name.into(),
            },
            vault_base,
            access_token,
            http: reqwest::Client::new(),
            signer: OnceCell::new(),
        }
    }

    /// Resolve the signing secret and return the shared signer.
    pub async fn signer(&self) -> Result<TokenSigner, SecretError> {
        let signer = self
            .signer
            .get_or_try_init(|| async {
                let secret = self.resolve_secret().await?;
                Ok::<_, SecretError>(TokenSigner::new(secret.as_bytes())?)
            })
            .await?;
        Ok(signer.clone())
    }

    async fn resolve_secret(&self) -> Result<String, SecretError> {
        match &self.source {
            SecretSource::Direct(value) => Ok(value.clone()),
            SecretSource::VaultReference {
                vault_name,
                secret_name,
            } => self.fetch_from_vault(vault_name, secret_name).await,
        }
    }

    async fn fetch_from_vault(
        &self,
        vault_name: &str,
        secret_name: &str,
    ) -> Result<String, SecretError> {
        let base = self
            .vault_base
            .clone()
            .unwrap_or_else(|| format!("https://{vault_name}.vault.azure.net"));
        let mut url = Url::parse(&base)
            .map_err(|err| SecretError::InvalidReference(format!("vault URL: {err}")))?;
        url.set_path(&format!("secrets/{secret_name}"));
        url.query_pairs_mut()
            .append_pair("api-version", VAULT_API_VERSION);

        let mut request = self.http.get(url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| SecretError::Vault(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SecretError::Vault(format!(
                "secret store returned {status} for `{secret_name}`"
            )));
        }

        let body: VaultSecretBody = response
            .json()
            .await
            .map_err(|err| SecretError::Vault(err.to_string()))?;
        if body.value.is_empty() {
            return Err(SecretError::Vault(format!(
                "secret `{secret_name}` in vault `{vault_name}` is empty"
            )));
        }
        Ok(body.value)
    }
}

#[derive(Deserialize)]
struct VaultSecretBody {
    value: String,
}

fn parse_source(raw: &str) -> Result<SecretSource, SecretError> {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed.strip_prefix("@Microsoft.KeyVault(") {
        let inner = inner
            .strip_suffix(')')
            .ok_or_else(|| SecretError::InvalidReference(trimmed.to_string()))?;
        return parse_reference(inner)
            .ok_or_else(|| SecretError::InvalidReference(trimmed.to_string()));
    }
    if trimmed.starts_with("VaultName=") {
        return parse_reference(trimmed)
            .ok_or_else(|| SecretError::InvalidReference(trimmed.to_string()));
    }
    Ok(SecretSource::Direct(trimmed.to_string()))
}

fn parse_reference(inner: &str) -> Option<SecretSource> {
    let rest = inner.split_once("VaultName=")?.1;
    let (vault_name, rest) = rest.split_once(';')?;
    let secret_name = rest.split_once("SecretName=")?.1;
    let vault_name = vault_name.trim();
    let secret_name = secret_name.trim();
    if vault_name.is_empty() || secret_name.is_empty() {
        return None;
    }
    Some(SecretSource::VaultReference {
        vault_name: vault_name.to_string(),
        secret_name: secret_name.to_string(),
    })
}
