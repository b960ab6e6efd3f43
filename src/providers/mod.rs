pub mod azure;
pub mod dev;
pub mod github;

use std::{env, sync::Arc};

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{AccessPolicy, ConfigError};

pub use azure::{AzureAdProvider, AzureProfile};
pub use dev::DevCredentialsProvider;
pub use github::{GitHubProfile, GitHubProvider};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("sign-in blocked: tenant `{0}` is not allowed")]
    TenantNotAllowed(String),
    #[error("identity token could not be decoded: {0}")]
    InvalidIdToken(String),
}

/// Common profile every provider maps into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub tenant_id: Option<String>,
    pub is_admin: bool,
    pub image: Option<String>,
}

/// Tokens handed over by the auth framework after the provider exchange.
#[derive(Debug, Clone, Default)]
pub struct ProviderTokens {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
}

/// The identity providers enabled for this deployment, built from whichever
/// credentials are present in the environment.
pub struct ProviderRegistry {
    github: Option<GitHubProvider>,
    azure: Option<AzureAdProvider>,
    dev: Option<DevCredentialsProvider>,
}

impl ProviderRegistry {
    pub fn from_env(policy: Arc<AccessPolicy>) -> Result<Self, ConfigError> {
        let github = github_from_env(policy.clone())?;
        let azure = azure_from_env(policy.clone())?;
        let dev = env::var("DEV_AUTH_ENABLED")
            .map(|value| is_truthy(&value))
            .unwrap_or(false)
            .then(|| DevCredentialsProvider::new(policy));

        if github.is_none() && azure.is_none() && dev.is_none() {
            return Err(ConfigError::InvalidConfig(
                "no identity providers configured".to_string(),
            ));
        }

        Ok(Self { github, azure, dev })
    }

    pub fn github(&self) -> Option<&GitHubProvider> {
        self.github.as_ref()
    }

    pub fn azure(&self) -> Option<&AzureAdProvider> {
        self.azure.as_ref()
    }

    pub fn dev(&self) -> Option<&DevCredentialsProvider> {
        self.dev.as_ref()
    }
}

fn github_from_env(policy: Arc<AccessPolicy>) -> Result<Option<GitHubProvider>, ConfigError> {
    let client_id = match env::var("AUTH_GITHUB_ID") {
        Ok(value) if !value.is_empty() => value,
        _ => return Ok(None),
    };
    let client_secret =
        env::var("AUTH_GITHUB_SECRET").map_err(|_| ConfigError::MissingEnv("AUTH_GITHUB_SECRET"))?;
    Ok(Some(GitHubProvider::new(client_id, client_secret, policy)))
}

fn azure_from_env(policy: Arc<AccessPolicy>) -> Result<Option<AzureAdProvider>, ConfigError> {
    let client_id = match env::var("AZURE_AD_CLIENT_ID") {
        Ok(value) if !value.is_empty() => value,
        _ => return Ok(None),
    };
    let client_secret = env::var("AZURE_AD_CLIENT_SECRET")
        .map_err(|_| ConfigError::MissingEnv("AZURE_AD_CLIENT_SECRET"))?;
    let tenant_id = env::var("AZURE_AD_TENANT_ID")
        .map_err(|_| ConfigError::MissingEnv("AZURE_AD_TENANT_ID"))?;
    Ok(Some(AzureAdProvider::new(
        client_id,
        client_secret,
        tenant_id,
        policy,
    )))
}

fn is_truthy(value: &str) -> bool {
    ["1", "true", "yes", "on"]
        .iter()
        .any(|candidate| value.trim().eq_ignore_ascii_case(candidate))
}

/// Fetch a profile photo and embed it as a `data:` URI. Sign-in never fails
/// on a missing picture, so every error path collapses to `None`.
pub(crate) async fn fetch_profile_picture(
    http: &reqwest::Client,
    url: &str,
    access_token: Option<&str>,
) -> Option<String> {
    let mut request = http.get(url);
    if let Some(token) = access_token {
        request = request.bearer_auth(token);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(%url, error = %err, "profile picture fetch failed");
            return None;
        }
    };
    if !response.status().is_success() {
        tracing::warn!(%url, status = %response.status(), "profile picture fetch rejected");
        return None;
    }

    match response.bytes().await {
        Ok(bytes) => Some(format!(
            "data:image/jpeg;base64,{}",
            BASE64_STANDARD.encode(&bytes)
        )),
        Err(err) => {
            tracing::warn!(%url, error = %err, "profile picture body unreadable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn truthy_values() {
        assert!(is_truthy("1"));
        assert!(is_truthy(" true "));
        assert!(is_truthy("YES"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("enabled"));
    }

    #[tokio::test]
    async fn photo_fetch_embeds_data_uri() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/photo"))
            .and(header("authorization", "Bearer graph-token"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpegbytes".to_vec()))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let url = format!("{}/photo", server.uri());
        let image = fetch_profile_picture(&http, &url, Some("graph-token")).await;
        assert_eq!(
            image.as_deref(),
            Some(format!("data:image/jpeg;base64,{}", BASE64_STANDARD.encode(b"jpegbytes")).as_str())
        );
    }

    #[tokio::test]
    async fn photo_fetch_failure_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/photo"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let url = format!("{}/photo", server.uri());
        assert_eq!(fetch_profile_picture(&http, &url, None).await, None);
    }
}
