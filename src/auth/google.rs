//! # Google OAuth 2.0 integration
//!
//! Authorization Code flow with PKCE. The structure mirrors
//! [`super::github`] but targets Google's endpoints and scopes.
//!
//! 1. [`authorize_url`](GoogleOAuth::authorize_url) builds an authorization
//!    URL requesting `openid`, `email`, and `profile` scopes, and persists
//!    the CSRF state + PKCE verifier in the `oauth_states` table with a
//!    10-minute expiry.
//! 2. [`exchange_code`](GoogleOAuth::exchange_code) atomically consumes the
//!    matching `oauth_states` row, exchanges the code for an access token,
//!    fetches the userinfo payload, and normalizes it to a
//!    [`ProviderProfile`]. A payload without an `id` is rejected as
//!    malformed — it never reaches the resolver.

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

/// Google user info from API.
#[derive(Debug, Deserialize)]
struct GoogleUser {
    id: Option<String>,
    given_name: Option<String>,
    name: Option<String>,
}

impl GoogleUser {
    fn into_profile(self) -> Result<ProviderProfile, AuthError> {
        let provider_id = self
            .id
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::MalformedProfile("id"))?;
        let display_name = self
            .given_name
            .or(self.name)
            .unwrap_or_else(|| provider_id.clone());
        Ok(ProviderProfile {
            provider: Provider::Google,
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

/// Google OAuth handler.
#[derive(Clone)]
pub struct GoogleOAuth {
    config: OAuthConfig,
}

impl GoogleOAuth {
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
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        sqlx::query(
            r#"
            INSERT INTO oauth_states (state, provider, pkce_verifier, expires_at)
            VALUES ($1, 'google', $2, NOW() + INTERVAL '10 minutes')
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
        // Retrieve and delete the state row, validating CSRF state and expiry
        // in one query.
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            DELETE FROM oauth_states
            WHERE state = $1 AND provider = 'google' AND expires_at > NOW()
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

        let api_client = Client::new();
        let google_user: GoogleUser = api_client
            .get("https://www.googleapis.com/oauth2/v2/userinfo")
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| AuthError::ProviderRejected(format!("userinfo fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::ProviderRejected(format!("userinfo decode failed: {e}")))?;

        google_user.into_profile()
    }
}
