//! Process bootstrap: configuration, pool, session layer, router.

use std::net::SocketAddr;

use anyhow::Context as _;
use axum::http::{header, HeaderValue, Method};
use time::Duration;
use tower_http::cors::CorsLayer;
use tower_sessions::cookie::Key;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use social_login::routes::{self, AppState};
use social_login::{db, Settings};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let settings = Settings::new().context("Failed to load settings")?;

    let pool = db::connect(&settings.database).await?;
    db::init_schema(&pool).await?;

    let session_store = PostgresStore::new(pool.clone());
    session_store
        .migrate()
        .await
        .context("Failed to migrate the session store")?;

    let key = Key::try_from(settings.session.secret.as_bytes())
        .context("SESSION_SECRET must provide at least 64 bytes of key material")?;
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(settings.session.ttl)))
        .with_signed(key);

    let origin: HeaderValue = settings
        .server
        .origin
        .parse()
        .context("SERVER_ORIGIN is not a valid header value")?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    let state = AppState::new(pool, &settings)?;
    let app = routes::router(state).layer(session_layer).layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.port));
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
