//! Normalized provider profiles.
//!
//! Each provider integration reduces its loosely-shaped callback payload to
//! one [`ProviderProfile`], which is all the resolver ever consumes. Subject
//! identifiers are scoped by [`Provider`], so a GitHub `"1"` and a Google
//! `"1"` never collide.

use std::fmt;

/// Supported identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    GitHub,
}

impl Provider {
    /// Stable lowercase name, used as the store's provider key and in paths.
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::GitHub => "github",
        }
    }

    /// Parse a path segment; `None` for unsupported providers.
    pub fn parse(s: &str) -> Option<Provider> {
        match s {
            "google" => Some(Provider::Google),
            "github" => Some(Provider::GitHub),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The provider-independent view of an authenticated subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider: Provider,
    /// Provider-issued subject identifier.
    pub provider_id: String,
    /// Display name captured at first login.
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_providers() {
        assert_eq!(Provider::parse("google"), Some(Provider::Google));
        assert_eq!(Provider::parse("github"), Some(Provider::GitHub));
        assert_eq!(Provider::parse("gitlab"), None);
        assert_eq!(Provider::parse("Google"), None);
    }
}
