//! OAuth client configuration, one per provider.

use anyhow::Context as _;
use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};

use crate::settings::Settings;

/// OAuth provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub auth_url: AuthUrl,
    pub token_url: TokenUrl,
    pub redirect_url: RedirectUrl,
}

impl OAuthConfig {
    /// GitHub OAuth config from settings.
    pub fn github(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            client_id: ClientId::new(settings.github.id.clone()),
            client_secret: ClientSecret::new(settings.github.secret.clone()),
            auth_url: AuthUrl::new("https://github.com/login/oauth/authorize".to_string())
                .context("Invalid GitHub authorization endpoint")?,
            token_url: TokenUrl::new("https://github.com/login/oauth/access_token".to_string())
                .context("Invalid GitHub token endpoint")?,
            redirect_url: RedirectUrl::new(settings.github.redirect.clone())
                .context("Invalid GitHub redirect URL")?,
        })
    }

    /// Google OAuth config from settings.
    pub fn google(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            client_id: ClientId::new(settings.google.id.clone()),
            client_secret: ClientSecret::new(settings.google.secret.clone()),
            auth_url: AuthUrl::new("https://accounts.google.com/o/oauth2/v2/auth".to_string())
                .context("Invalid Google authorization endpoint")?,
            token_url: TokenUrl::new("https://oauth2.googleapis.com/token".to_string())
                .context("Invalid Google token endpoint")?,
            redirect_url: RedirectUrl::new(settings.google.redirect.clone())
                .context("Invalid Google redirect URL")?,
        })
    }
}
