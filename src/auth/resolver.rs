//! # Provider resolver — find-or-create
//!
//! Maps a normalized provider profile to exactly one local user record.
//! Either the existing record is returned, or a new one is created; the two
//! outcomes are mutually exclusive and a store failure aborts the login
//! instead of falling back to "treat as new".
//!
//! The find-then-create pair is not atomic. Two concurrent first logins for
//! the same subject can both observe "absent"; the store's uniqueness
//! constraint makes the losing `create` fail with a conflict, and the loser
//! then re-reads and returns the winner's record.

use crate::error::{AuthError, StoreError};
use crate::models::User;
use crate::store::IdentityStore;

use super::profile::ProviderProfile;

/// Resolve a provider profile to the one local user it denotes.
pub async fn resolve<S: IdentityStore + ?Sized>(
    store: &S,
    profile: &ProviderProfile,
) -> Result<User, AuthError> {
    if let Some(existing) = store
        .find_by_provider_id(profile.provider, &profile.provider_id)
        .await?
    {
        return Ok(existing);
    }

    match store
        .create(profile.provider, &profile.provider_id, &profile.display_name)
        .await
    {
        Ok(created) => Ok(created),
        Err(StoreError::Conflict) => {
            // Lost a concurrent first-login race; the winner's record stands.
            tracing::debug!(
                provider = %profile.provider,
                provider_id = %profile.provider_id,
                "create conflicted, re-reading winner"
            );
            store
                .find_by_provider_id(profile.provider, &profile.provider_id)
                .await?
                .ok_or(AuthError::StoreFailure(StoreError::Conflict))
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::auth::profile::Provider;
    use crate::store::testing::MemStore;

    fn google_profile(id: &str, name: &str) -> ProviderProfile {
        ProviderProfile {
            provider: Provider::Google,
            provider_id: id.to_string(),
            display_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn first_login_creates_exactly_one_record() {
        let store = MemStore::default();
        let user = resolve(&store, &google_profile("g1", "Ada")).await.unwrap();
        assert_eq!(user.provider, "google");
        assert_eq!(user.provider_id, "g1");
        assert_eq!(user.username, "Ada");
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn second_login_reuses_the_record() {
        let store = MemStore::default();
        let first = resolve(&store, &google_profile("g1", "Ada")).await.unwrap();
        let second = resolve(&store, &google_profile("g1", "Ada")).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn identifiers_are_scoped_per_provider() {
        let store = MemStore::default();
        let google = resolve(&store, &google_profile("1", "Ada")).await.unwrap();
        let github = resolve(
            &store,
            &ProviderProfile {
                provider: Provider::GitHub,
                provider_id: "1".to_string(),
                display_name: "bob".to_string(),
            },
        )
        .await
        .unwrap();
        assert_ne!(google.id, github.id);
        assert_eq!(store.user_count(), 2);
    }

    #[tokio::test]
    async fn store_failure_aborts_without_creating() {
        let store = MemStore::default();
        store.fail_reads.store(true, Ordering::SeqCst);
        let err = resolve(&store, &google_profile("g1", "Ada"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StoreFailure(_)));
        store.fail_reads.store(false, Ordering::SeqCst);
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn create_conflict_returns_the_race_winner() {
        let store = MemStore::default();
        // Another request commits the same identity between our lookup and
        // our create.
        let winner = User {
            id: uuid::Uuid::new_v4(),
            provider: "google".to_string(),
            provider_id: "g1".to_string(),
            username: "Ada".to_string(),
            created_at: chrono::Utc::now(),
        };
        *store.race_winner.lock().unwrap() = Some(winner.clone());

        let resolved = resolve(&store, &google_profile("g1", "Ada")).await.unwrap();
        assert_eq!(resolved.id, winner.id);
        assert_eq!(store.user_count(), 1);
    }
}
