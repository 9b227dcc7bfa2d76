//! # HTTP surface and session gate
//!
//! Routes:
//!
//! | Route | Behavior |
//! |-------|----------|
//! | `GET /auth/{provider}` | 302 to the provider's authorization URL |
//! | `GET /auth/{provider}/callback` | run the resolver, bind the session, 302 to the configured destination |
//! | `GET /getuser` | JSON of the resolved identity, or `null` when anonymous |
//! | `GET /auth/logout` | flush the session, JSON confirmation |
//!
//! Callback failures of every kind redirect to the failure destination; a
//! user who declines consent never sees a 5xx. The [`CurrentUser`] extractor
//! is the per-request session gate: it re-resolves the session token through
//! the codec and hands handlers either the identity or the anonymous state.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::response::Redirect;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use sqlx::PgPool;
use tower_sessions::Session;

use crate::auth::{self, resolver, GitHubOAuth, GoogleOAuth, OAuthConfig, Provider};
use crate::auth::SESSION_USER_ID_KEY;
use crate::error::{ApiError, AuthError, SessionError};
use crate::models::{User, UserInfo};
use crate::settings::Settings;
use crate::store::{IdentityStore, PgIdentityStore};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub store: Arc<dyn IdentityStore>,
    pub google: GoogleOAuth,
    pub github: GitHubOAuth,
    pub success_redirect: String,
    pub failure_redirect: String,
}

impl AppState {
    pub fn new(pool: PgPool, settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            store: Arc::new(PgIdentityStore::new(pool.clone())),
            google: GoogleOAuth::new(OAuthConfig::google(settings)?),
            github: GitHubOAuth::new(OAuthConfig::github(settings)?),
            success_redirect: settings.auth.success.clone(),
            failure_redirect: settings.auth.failure.clone(),
            pool,
        })
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/auth/{provider}", get(begin_auth))
        .route("/auth/{provider}/callback", get(auth_callback))
        .route("/getuser", get(get_user))
        .route("/auth/logout", get(logout))
        .with_state(state)
}

/// Resolved identity for the current request, or the anonymous state.
///
/// `SessionError::NotFound` (no token, stale token, deleted user) is
/// recovered here as `CurrentUser(None)`; only store transport failures
/// reject the request.
pub struct CurrentUser(pub Option<User>);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| ApiError::Session(SessionError::Backend(msg.to_string())))?;

        let token: Option<String> = session
            .get(SESSION_USER_ID_KEY)
            .await
            .map_err(|e| ApiError::Session(SessionError::Backend(e.to_string())))?;

        let Some(token) = token else {
            return Ok(CurrentUser(None));
        };

        match auth::session::deserialize(state.store.as_ref(), &token).await {
            Ok(user) => Ok(CurrentUser(Some(user))),
            Err(SessionError::NotFound) => Ok(CurrentUser(None)),
            Err(err) => Err(ApiError::Session(err)),
        }
    }
}

async fn index() -> &'static str {
    "Hello World"
}

/// Begin the delegated handshake: 302 to the provider.
async fn begin_auth(
    Path(provider): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, ApiError> {
    let provider =
        Provider::parse(&provider).ok_or_else(|| ApiError::UnknownProvider(provider))?;
    let url = match provider {
        Provider::Google => state.google.authorize_url(&state.pool).await?,
        Provider::GitHub => state.github.authorize_url(&state.pool).await?,
    };
    Ok(Redirect::to(&url))
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Provider callback: resolve the identity and bind the session.
///
/// Every failure redirects to the failure destination with no session
/// written; success redirects to the post-login destination. No body either
/// way.
async fn auth_callback(
    Path(provider): Path<String>,
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
    session: Session,
) -> Redirect {
    match complete_login(&state, &provider, params, &session).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, provider = %user.provider, "login complete");
            Redirect::to(&state.success_redirect)
        }
        Err(err) => {
            tracing::warn!(error = %err, provider = %provider, "login failed");
            Redirect::to(&state.failure_redirect)
        }
    }
}

async fn complete_login(
    state: &AppState,
    provider: &str,
    params: CallbackParams,
    session: &Session,
) -> Result<User, ApiError> {
    let provider =
        Provider::parse(provider).ok_or_else(|| ApiError::UnknownProvider(provider.to_string()))?;

    if let Some(error) = params.error {
        let desc = params.error_description.unwrap_or(error);
        return Err(AuthError::ProviderRejected(desc).into());
    }
    let code = params
        .code
        .ok_or_else(|| AuthError::ProviderRejected("missing code".to_string()))?;
    let csrf_state = params
        .state
        .ok_or_else(|| AuthError::ProviderRejected("missing state".to_string()))?;

    let profile = match provider {
        Provider::Google => {
            state
                .google
                .exchange_code(&state.pool, &code, &csrf_state)
                .await?
        }
        Provider::GitHub => {
            state
                .github
                .exchange_code(&state.pool, &code, &csrf_state)
                .await?
        }
    };

    let user = resolver::resolve(state.store.as_ref(), &profile).await?;

    // Binding the session is the final step, so a failed login never leaves
    // a partial session behind.
    session
        .insert(SESSION_USER_ID_KEY, auth::session::serialize(&user))
        .await
        .map_err(|e| ApiError::Session(SessionError::Backend(e.to_string())))?;

    Ok(user)
}

/// The resolved identity of the current request, or `null` when anonymous.
async fn get_user(CurrentUser(user): CurrentUser) -> Json<Option<UserInfo>> {
    Json(user.map(|u| u.to_info()))
}

/// Clear the session. The user record itself is untouched.
async fn logout(session: Session) -> Result<Json<serde_json::Value>, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::Session(SessionError::Backend(e.to_string())))?;
    Ok(Json(serde_json::json!({ "status": "done" })))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use super::*;
    use crate::store::testing::MemStore;

    fn oauth_config() -> OAuthConfig {
        OAuthConfig {
            client_id: ClientId::new("client".to_string()),
            client_secret: ClientSecret::new("secret".to_string()),
            auth_url: AuthUrl::new("https://example.com/auth".to_string()).unwrap(),
            token_url: TokenUrl::new("https://example.com/token".to_string()).unwrap(),
            redirect_url: RedirectUrl::new("http://localhost:4000/cb".to_string()).unwrap(),
        }
    }

    /// The app with an in-memory identity store and session store, plus a
    /// side door that binds a session the way a completed callback would.
    fn test_app(store: Arc<MemStore>, login_token: String) -> Router {
        let identity_store: Arc<dyn IdentityStore> = store;
        let state = AppState {
            pool: PgPoolOptions::new()
                .connect_lazy("postgres://localhost:5432/unused")
                .unwrap(),
            store: identity_store,
            google: GoogleOAuth::new(oauth_config()),
            github: GitHubOAuth::new(oauth_config()),
            success_redirect: "http://localhost:3000".to_string(),
            failure_redirect: "http://localhost:3000/login".to_string(),
        };

        let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);

        router(state)
            .route(
                "/bind-session",
                get(move |session: Session| {
                    let token = login_token.clone();
                    async move {
                        session.insert(SESSION_USER_ID_KEY, token).await.unwrap();
                    }
                }),
            )
            .layer(session_layer)
    }

    async fn send(app: &Router, uri: &str, cookie: Option<&str>) -> axum::response::Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        app.clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn session_cookie(response: &axum::response::Response) -> String {
        response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn getuser_without_session_is_anonymous() {
        let store = Arc::new(MemStore::default());
        let app = test_app(store, "unused".to_string());

        let response = send(&app, "/getuser", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Option<UserInfo> = body_json(response).await;
        assert_eq!(body, None);
    }

    #[tokio::test]
    async fn logout_clears_the_session_but_not_the_record() {
        let store = Arc::new(MemStore::default());
        let user = store.insert(Provider::Google, "g1", "Ada");
        let app = test_app(store.clone(), auth::session::serialize(&user));

        let response = send(&app, "/bind-session", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);

        let response = send(&app, "/getuser", Some(&cookie)).await;
        let body: Option<UserInfo> = body_json(response).await;
        assert_eq!(body, Some(user.to_info()));

        let response = send(&app, "/auth/logout", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let confirmation: serde_json::Value = body_json(response).await;
        assert_eq!(confirmation["status"], "done");

        let response = send(&app, "/getuser", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Option<UserInfo> = body_json(response).await;
        assert_eq!(body, None);

        // The user record outlives the session.
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn stale_session_token_is_anonymous() {
        let store = Arc::new(MemStore::default());
        let app = test_app(store, uuid::Uuid::new_v4().to_string());

        let response = send(&app, "/bind-session", None).await;
        let cookie = session_cookie(&response);

        let response = send(&app, "/getuser", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Option<UserInfo> = body_json(response).await;
        assert_eq!(body, None);
    }
}
