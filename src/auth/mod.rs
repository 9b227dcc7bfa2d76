//! Authentication module for OAuth providers.

mod config;
mod github;
mod google;
mod profile;
pub mod resolver;
pub mod session;

pub use config::OAuthConfig;
pub use github::GitHubOAuth;
pub use google::GoogleOAuth;
pub use profile::{Provider, ProviderProfile};
pub use session::SESSION_USER_ID_KEY;
