//! Error taxonomy for the identity-resolution core.
//!
//! Three layers, matching who recovers from what:
//!
//! - [`StoreError`] — identity-store transport and write failures. Never
//!   interpreted as "user absent": a failed lookup aborts the login.
//! - [`AuthError`] — outcome of one login attempt. Surfaced to the browser
//!   only as a redirect to the failure destination, never a 5xx for a
//!   user-declined consent.
//! - [`SessionError`] — session re-resolution. `NotFound` is recovered
//!   locally as the anonymous state and never reaches the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Identity store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connectivity or transport failure on a read.
    #[error("store read failed: {0}")]
    Connect(#[source] sqlx::Error),

    /// Write failure on create.
    #[error("store write failed: {0}")]
    Write(#[source] sqlx::Error),

    /// Unique-constraint violation: another request created the same
    /// `(provider, provider_id)` record first.
    #[error("duplicate provider identity")]
    Conflict,
}

/// Failure of one login attempt.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The provider declined the login (consent denied, invalid or expired
    /// state, token exchange refused).
    #[error("provider rejected the login: {0}")]
    ProviderRejected(String),

    /// The identity store failed mid-resolution. Never downgraded to a
    /// "treat as new user" fallback.
    #[error("identity store failure")]
    StoreFailure(#[from] StoreError),

    /// The provider profile payload lacks a required field.
    #[error("provider profile missing `{0}` field")]
    MalformedProfile(&'static str),
}

/// Failure while re-resolving an identity from a session token.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The token no longer resolves to a user. Treated as anonymous.
    #[error("session token does not resolve to a user")]
    NotFound,

    /// The identity store failed during the lookup.
    #[error("identity store failure during session lookup")]
    Store(#[from] StoreError),

    /// The session storage collaborator itself failed.
    #[error("session backend failure: {0}")]
    Backend(String),
}

/// Request-level error for handlers that answer with a status code rather
/// than a redirect.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unknown provider `{0}`")]
    UnknownProvider(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::UnknownProvider(_) => (StatusCode::NOT_FOUND, self.to_string()).into_response(),
            Self::Auth(AuthError::ProviderRejected(_))
            | Self::Auth(AuthError::MalformedProfile(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            Self::Auth(AuthError::StoreFailure(_)) | Self::Session(_) => {
                tracing::error!(error = %self, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}
