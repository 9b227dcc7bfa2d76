//! # Session codec
//!
//! Converts between a full user record and the compact token kept in the
//! server-side session. The token is always the local record id — never the
//! full record, and never a provider-issued identifier — so nothing stale or
//! sensitive round-trips through session storage.

use uuid::Uuid;

use crate::error::SessionError;
use crate::models::User;
use crate::store::IdentityStore;

/// Key for storing the user id in the session.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// Reduce a user record to its session token.
pub fn serialize(user: &User) -> String {
    user.id.to_string()
}

/// Re-resolve a session token to the user it denotes.
///
/// An unparseable token or an id with no backing row yields
/// [`SessionError::NotFound`], which the gate recovers as anonymous. Store
/// transport failures propagate.
pub async fn deserialize<S: IdentityStore + ?Sized>(
    store: &S,
    token: &str,
) -> Result<User, SessionError> {
    let id = Uuid::parse_str(token).map_err(|_| SessionError::NotFound)?;
    store.find_by_id(id).await?.ok_or(SessionError::NotFound)
}
