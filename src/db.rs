//! PostgreSQL connection pool and schema setup.

use anyhow::Context as _;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::settings::Database;

/// Open a connection pool to the database.
pub async fn connect(settings: &Database) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.url())
        .await
        .context("Failed to connect to the database")?;
    Ok(pool)
}

/// Create the tables if they don't exist.
///
/// `users` carries the uniqueness constraint that makes concurrent
/// first-callback races resolvable: the losing insert fails with a unique
/// violation instead of producing a second record.
pub async fn init_schema(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            provider TEXT NOT NULL,
            provider_id TEXT NOT NULL,
            username TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (provider, provider_id)
        );",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS oauth_states (
            state TEXT PRIMARY KEY,
            provider TEXT NOT NULL,
            pkce_verifier TEXT NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL
        );",
    )
    .execute(pool)
    .await
    .context("Failed to create oauth_states table")?;

    Ok(())
}
