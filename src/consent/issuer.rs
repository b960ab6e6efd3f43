use std::{sync::Arc, time::Duration};

use url::Url;

use crate::{
    config::{ConfigError, ConsentSettings},
    secrets::SecretProvider,
};

use super::{ConsentClaims, ConsentError, TenantSelector};

/// Builds signed admin-consent authorization URLs.
///
/// Stateless apart from the signer cached inside the secret provider; each
/// issued URL is self-contained.
pub struct ConsentUrlIssuer {
    settings: Arc<ConsentSettings>,
    secrets: Arc<SecretProvider>,
}

impl ConsentUrlIssuer {
    pub fn new(settings: Arc<ConsentSettings>, secrets: Arc<SecretProvider>) -> Self {
        Self { settings, secrets }
    }

    /// Mint a fresh state token for `selector` and embed it in the
    /// authorization URL. `ttl` falls back to the configured default.
    pub async fn issue(
        &self,
        selector: &TenantSelector,
        ttl: Option<Duration>,
    ) -> Result<Url, ConsentError> {
        if self.settings.client_id.trim().is_empty() {
            return Err(ConfigError::MissingEnv("AZURE_AD_CLIENT_ID").into());
        }
        if self.settings.callback_url.trim().is_empty() {
            return Err(ConfigError::MissingEnv("ADMIN_CONSENT_CALLBACK_URL").into());
        }

        let signer = self.secrets.signer().await?;
        let claims = ConsentClaims::new(
            &self.settings.callback_url,
            ttl.unwrap_or(self.settings.default_ttl),
        );
        let state_jwt = signer.sign(&claims)?;

        let mut url = authority_base(&self.settings.authority)?;
        url.path_segments_mut()
            .map_err(|_| {
                ConsentError::Config(ConfigError::InvalidConfig(format!(
                    "authority `{}` cannot carry a path",
                    self.settings.authority
                )))
            })?
            .pop_if_empty()
            .push(selector.as_str())
            .push("adminconsent");
        url.query_pairs_mut()
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("state", &state_jwt)
            .append_pair("redirect_uri", &self.settings.callback_url);

        Ok(url)
    }
}

fn authority_base(authority: &str) -> Result<Url, ConsentError> {
    let base = if authority.starts_with("http://") || authority.starts_with("https://") {
        authority.to_string()
    } else {
        format!("https://{authority}")
    };
    Url::parse(&base).map_err(|err| {
        ConsentError::Config(ConfigError::InvalidConfig(format!(
            "invalid consent authority `{authority}`: {err}"
        )))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings() -> ConsentSettings {
        ConsentSettings {
            authority: "login.microsoftonline.com".into(),
            client_id: "client-123".into(),
            callback_url: "https://chat.example.com/api/consent/callback".into(),
            success_redirect: Url::parse("https://chat.example.com/chat").unwrap(),
            failure_redirect: Url::parse("https://chat.example.com/reporting").unwrap(),
            default_ttl: Duration::from_secs(86_400),
        }
    }

    fn issuer(settings: ConsentSettings) -> ConsentUrlIssuer {
        ConsentUrlIssuer::new(
            Arc::new(settings),
            Arc::new(SecretProvider::direct("issuer-test-secret")),
        )
    }

    #[tokio::test]
    async fn guid_selector_appears_in_path_exactly_once() {
        let guid = "72f988bf-86f1-41af-91ab-2d7cd011db47";
        let selector = TenantSelector::parse(guid).unwrap();
        let url = issuer(settings()).issue(&selector, None).await.expect("url");

        assert_eq!(url.path(), format!("/{guid}/adminconsent"));
        assert_eq!(url.as_str().matches(guid).count(), 1);
        assert_eq!(url.host_str(), Some("login.microsoftonline.com"));
    }

    #[tokio::test]
    async fn url_carries_encoded_client_id_state_and_redirect() {
        let selector = TenantSelector::parse("organizations").unwrap();
        let url = issuer(settings()).issue(&selector, None).await.expect("url");
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(params.get("client_id"), Some(&"client-123".to_string()));
        assert_eq!(
            params.get("redirect_uri"),
            Some(&"https://chat.example.com/api/consent/callback".to_string())
        );
        let state = params.get("state").expect("state param");
        assert_eq!(state.split('.').count(), 3);
        // the raw redirect URI must only appear percent-encoded in the query
        assert!(!url
            .as_str()
            .contains("redirect_uri=https://chat.example.com"));
    }

    #[tokio::test]
    async fn issued_state_verifies_with_requested_ttl() {
        let selector = TenantSelector::parse("common").unwrap();
        let secrets = Arc::new(SecretProvider::direct("issuer-test-secret"));
        let issuer = ConsentUrlIssuer::new(Arc::new(settings()), secrets.clone());
        let url = issuer
            .issue(&selector, Some(Duration::from_secs(600)))
            .await
            .expect("url");

        let state = url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.to_string())
            .expect("state");
        let signer = secrets.signer().await.unwrap();
        let claims: ConsentClaims = signer.verify(&state).expect("claims");
        assert!(claims.has_consent_purpose());
        assert_eq!(claims.exp - claims.iat, 600);
        assert_eq!(
            claims.redirect_uri,
            "https://chat.example.com/api/consent/callback"
        );
    }

    #[tokio::test]
    async fn blank_client_id_is_a_configuration_error() {
        let mut bad = settings();
        bad.client_id = "  ".into();
        let err = issuer(bad)
            .issue(&TenantSelector::parse("common").unwrap(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsentError::Config(_)));
    }
}
