//! # social-login — delegated login bound to server-side sessions
//!
//! A small HTTP service that authenticates users through third-party OAuth
//! providers (Google, GitHub) and keeps a minimal local user record keyed by
//! provider identity. The provider handshake is delegated to the `oauth2`
//! crate, persistence to PostgreSQL via `sqlx`, and session storage to
//! `tower-sessions` with a Postgres-backed store.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | OAuth provider integrations, profile normalization, the find-or-create resolver, and the session codec |
//! | [`db`] | PostgreSQL connection pool and idempotent schema setup |
//! | [`error`] | Error taxonomy (`StoreError`, `AuthError`, `SessionError`) and HTTP mappings |
//! | [`models`] | The persisted `User` record and its client-safe `UserInfo` projection |
//! | [`routes`] | Axum router, handlers, and the `CurrentUser` session gate |
//! | [`settings`] | Layered configuration (defaults, `config.toml`, environment) |
//! | [`store`] | The `IdentityStore` contract and its Postgres implementation |

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod settings;
pub mod store;

pub use models::UserInfo;
pub use settings::Settings;
