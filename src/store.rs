//! # Identity store
//!
//! Persistence contract for user records. The store owns persistence
//! exclusively: the resolver creates records through it, the session codec
//! only reads them back by id.
//!
//! Transport failures surface as [`StoreError`] and are never collapsed into
//! "absent" — a failed lookup must abort the login rather than mint a
//! duplicate user.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::Provider;
use crate::error::StoreError;
use crate::models::User;

/// Persistence contract for user records.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Point lookup by `(provider, provider_id)`.
    async fn find_by_provider_id(
        &self,
        provider: Provider,
        provider_id: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Lookup by local id, for the session codec.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Insert a new record with a fresh id. A unique violation on
    /// `(provider, provider_id)` maps to [`StoreError::Conflict`].
    async fn create(
        &self,
        provider: Provider,
        provider_id: &str,
        username: &str,
    ) -> Result<User, StoreError>;
}

/// Postgres-backed identity store.
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn read_error(err: sqlx::Error) -> StoreError {
    StoreError::Connect(err)
}

fn write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict;
        }
    }
    StoreError::Write(err)
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_provider_id(
        &self,
        provider: Provider,
        provider_id: &str,
    ) -> Result<Option<User>, StoreError> {
        sqlx::query_as("SELECT * FROM users WHERE provider = $1 AND provider_id = $2")
            .bind(provider.as_str())
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_error)
    }

    async fn create(
        &self,
        provider: Provider,
        provider_id: &str,
        username: &str,
    ) -> Result<User, StoreError> {
        sqlx::query_as(
            "INSERT INTO users (id, provider, provider_id, username)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(provider.as_str())
        .bind(provider_id)
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)
    }
}
