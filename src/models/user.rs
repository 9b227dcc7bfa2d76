//! # User model
//!
//! The only persisted entity. One row exists per `(provider, provider_id)`
//! pair, created exactly once at the first successful callback from that
//! provider and never updated or deleted afterwards.
//!
//! - `id` — local primary key (`UUID v4`), assigned on creation. This is the
//!   only value the session codec ever serializes.
//! - `provider` / `provider_id` — the provider name and the provider-issued
//!   subject identifier. Identifiers from different providers live in
//!   disjoint keyspaces even when their raw values collide.
//! - `username` — display name captured from the provider profile at first
//!   login; not unique, never refreshed.
//!
//! [`UserInfo`] is the client-safe projection returned by `/getuser`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Full user record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub provider: String,
    pub provider_id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id.to_string(),
            provider: self.provider.clone(),
            username: self.username.clone(),
        }
    }
}

/// User information safe to send to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: String,
    pub provider: String,
    pub username: String,
}
