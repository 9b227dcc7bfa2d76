//! # GitHub OAuth 2.0 integration
//!
//! Authorization Code flow with PKCE against GitHub's endpoints; see
//! [`super::google`] for the flow description. GitHub issues numeric subject
//! ids and calls the login handle `login`, both of which are normalized away
//! here.

use oauth2::basic::BasicClient;
use oauth2::{
    AuthorizationCode, CsrfToken, EndpointNotSet, EndpointSet, PkceCodeChallenge,
    PkceCodeVerifier, Scope, TokenResponse,
};
use reqwest::Client;
use serde::Deserialize;
use sqlx::PgPool;

use super::config::OAuthConfig;
use super::profile::{Provider, ProviderProfile};
use crate::error::{AuthError, StoreError};

/// GitHub user info from API.
#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: Option<i64>,
    login: Option<String>,
    name: Option<String>,
}

impl GitHubUser {
    fn into_profile(self) -> Result<ProviderProfile, AuthError> {
        let provider_id = self
            .id
            .ok_or(AuthError::MalformedProfile("id"))?
            .to_string();
        let display_name = self
            .login
            .or(self.name)
            .unwrap_or_else(|| provider_id.clone());
        Ok(ProviderProfile {
            provider: Provider::GitHub,
            provider_id,
            display_name,
        })
    }
}

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// GitHub OAuth handler.
#[derive(Clone)]
pub struct GitHubOAuth {
    config: OAuthConfig,
}

impl GitHubOAuth {
    pub fn new(config: OAuthConfig) -> Self {
        Self { config }
    }

    fn create_client(&self) -> ConfiguredClient {
        BasicClient::new(self.config.client_id.clone())
            .set_client_secret(self.config.client_secret.clone())
            .set_auth_uri(self.config.auth_url.clone())
            .set_token_uri(self.config.token_url.clone())
            .set_redirect_uri(self.config.redirect_url.clone())
    }

    /// Generate the authorization URL with PKCE and persist the handshake state.
    pub async fn authorize_url(&self, pool: &PgPool) -> Result<String, AuthError> {
        let client = self.create_client();
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_state) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("read:user".to_string()))
            .add_scope(Scope::new("user:email".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        sqlx::query(
            r#"
            INSERT INTO oauth_states (state, provider, pkce_verifier, expires_at)
            VALUES ($1, 'github', $2, NOW() + INTERVAL '10 minutes')
            "#,
        )
        .bind(csrf_state.secret())
        .bind(pkce_verifier.secret())
        .execute(pool)
        .await
        .map_err(|e| AuthError::StoreFailure(StoreError::Write(e)))?;

        Ok(auth_url.to_string())
    }

    /// Exchange the authorization code for a normalized profile.
    pub async fn exchange_code(
        &self,
        pool: &PgPool,
        code: &str,
        state: &str,
    ) -> Result<ProviderProfile, AuthError> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            DELETE FROM oauth_states
            WHERE state = $1 AND provider = 'github' AND expires_at > NOW()
            RETURNING pkce_verifier
            "#,
        )
        .bind(state)
        .fetch_optional(pool)
        .await
        .map_err(|e| AuthError::StoreFailure(StoreError::Connect(e)))?;

        let pkce_verifier = row
            .ok_or_else(|| AuthError::ProviderRejected("invalid or expired state".to_string()))?
            .0;

        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::ProviderRejected(e.to_string()))?;

        let client = self.create_client();

        let token_result = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
            .request_async(&http_client)
            .await
            .map_err(|e| AuthError::ProviderRejected(format!("token exchange failed: {e}")))?;

        let access_token = token_result.access_token().secret();

        // GitHub requires a User-Agent header on API requests.
        let api_client = Client::new();
        let github_user: GitHubUser = api_client
            .get("https://api.github.com/user")
            .header("Authorization", format!("Bearer {}", access_token))
            .header("User-Agent", "social-login")
            .send()
            .await
            .map_err(|e| AuthError::ProviderRejected(format!("user fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::ProviderRejected(format!("user decode failed: {e}")))?;

        github_user.into_profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_uses_login() {
        let raw: GitHubUser =
            serde_json::from_value(serde_json::json!({ "id": 42, "login": "bob" })).unwrap();
        let profile = raw.into_profile().unwrap();
        assert_eq!(profile.provider, Provider::GitHub);
        assert_eq!(profile.provider_id, "42");
        assert_eq!(profile.display_name, "bob");
    }

    #[test]
    fn missing_id_is_malformed() {
        let raw: GitHubUser =
            serde_json::from_value(serde_json::json!({ "login": "bob" })).unwrap();
        assert!(matches!(
            raw.into_profile(),
            Err(AuthError::MalformedProfile("id"))
        ));
    }
}
