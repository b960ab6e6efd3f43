use std::sync::Arc;

use serde::Deserialize;

use crate::config::AccessPolicy;

use super::{fetch_profile_picture, UserProfile};

/// Raw profile from the GitHub OAuth provider.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubProfile {
    pub id: u64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

#[allow(dead_code)]
pub struct GitHubProvider {
    client_id: String,
    client_secret: String,
    policy: Arc<AccessPolicy>,
    http: reqwest::Client,
}

impl GitHubProvider {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        policy: Arc<AccessPolicy>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            policy,
            http: reqwest::Client::new(),
        }
    }

    pub async fn map_profile(&self, profile: &GitHubProfile) -> UserProfile {
        let email = profile.email.clone().unwrap_or_default();
        let image = match profile.avatar_url.as_deref() {
            Some(url) => fetch_profile_picture(&self.http, url, None).await,
            None => None,
        };

        UserProfile {
            id: profile.id.to_string(),
            name: profile
                .name
                .clone()
                .unwrap_or_else(|| profile.login.clone()),
            email: email.clone(),
            tenant_id: None,
            is_admin: self.policy.is_admin_email(&email),
            image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> GitHubProfile {
        GitHubProfile {
            id: 583231,
            login: "octocat".into(),
            name: None,
            email: Some("octocat@github.com".into()),
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn login_stands_in_for_a_missing_name() {
        let provider = GitHubProvider::new("id", "secret", Arc::new(AccessPolicy::default()));
        let mapped = provider.map_profile(&profile()).await;
        assert_eq!(mapped.id, "583231");
        assert_eq!(mapped.name, "octocat");
        assert!(!mapped.is_admin);
        assert_eq!(mapped.tenant_id, None);
    }

    #[tokio::test]
    async fn allowlisted_email_grants_admin() {
        let policy = AccessPolicy::from_lists(vec!["octocat@github.com".into()], vec![]);
        let provider = GitHubProvider::new("id", "secret", Arc::new(policy));
        assert!(provider.map_profile(&profile()).await.is_admin);
    }

    #[tokio::test]
    async fn missing_email_never_grants_admin() {
        let policy = AccessPolicy::from_lists(vec!["".into()], vec![]);
        let provider = GitHubProvider::new("id", "secret", Arc::new(policy));
        let mut raw = profile();
        raw.email = None;
        assert!(!provider.map_profile(&raw).await.is_admin);
    }
}
