//! Identity resolution: validated credential → acting principal.

use thiserror::Error;

use crate::{Principal, UserStore, UserStoreError, ValidatedCredential};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("principal not found")]
    PrincipalNotFound,

    #[error("principal is inactive")]
    PrincipalInactive,

    /// The lookup itself failed; this is not an authentication verdict.
    #[error("identity lookup failed: {0}")]
    Store(UserStoreError),
}

/// Resolves principals from the user store. Read-only.
#[derive(Debug, Clone)]
pub struct IdentityResolver<S> {
    store: S,
}

impl<S> IdentityResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S> IdentityResolver<S>
where
    S: UserStore,
{
    pub async fn resolve(&self, credential: &ValidatedCredential) -> Result<Principal, IdentityError> {
        let record = self
            .store
            .find_by_id(credential.sub)
            .await
            .map_err(IdentityError::Store)?
            .ok_or(IdentityError::PrincipalNotFound)?;

        if !record.is_active {
            tracing::debug!(principal_id = %record.id, "credential belongs to an inactive account");
            return Err(IdentityError::PrincipalInactive);
        }

        Ok(record.to_principal())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    use warden_core::{Email, UserId};

    use super::*;
    use crate::{NewUser, PasswordHash, Role, UserChanges, UserRecord};

    /// Lookup-only fake; mutations are not needed here.
    #[derive(Default)]
    struct LookupStore {
        users: Mutex<HashMap<UserId, UserRecord>>,
        offline: bool,
    }

    impl LookupStore {
        fn with(record: UserRecord) -> Self {
            let store = Self::default();
            store.users.lock().unwrap().insert(record.id, record);
            store
        }
    }

    #[async_trait]
    impl UserStore for LookupStore {
        async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, UserStoreError> {
            if self.offline {
                return Err(UserStoreError::Unavailable("offline".to_string()));
            }
            Ok(self.users.lock().unwrap().get(&id).cloned())
        }

        async fn find_by_email(&self, _email: &Email) -> Result<Option<UserRecord>, UserStoreError> {
            unimplemented!()
        }

        async fn list(&self, _limit: usize, _offset: usize) -> Result<Vec<UserRecord>, UserStoreError> {
            unimplemented!()
        }

        async fn create(&self, _user: NewUser) -> Result<UserRecord, UserStoreError> {
            unimplemented!()
        }

        async fn update(
            &self,
            _id: UserId,
            _expected_version: u64,
            _changes: UserChanges,
        ) -> Result<UserRecord, UserStoreError> {
            unimplemented!()
        }

        async fn delete(&self, _id: UserId, _expected_version: u64) -> Result<UserRecord, UserStoreError> {
            unimplemented!()
        }
    }

    fn record(is_active: bool) -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: UserId::new(),
            name: "Alice".to_string(),
            lastname: "Smith".to_string(),
            email: Email::parse("alice@example.com").unwrap(),
            password_hash: PasswordHash::from_phc("x"),
            roles: vec![Role::ADMIN],
            is_active,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    fn credential_for(id: UserId) -> ValidatedCredential {
        let now = Utc::now();
        ValidatedCredential {
            sub: id,
            issued_at: now,
            expires_at: now + Duration::minutes(10),
        }
    }

    #[tokio::test]
    async fn active_account_resolves_to_principal_with_roles() {
        let user = record(true);
        let resolver = IdentityResolver::new(LookupStore::with(user.clone()));

        let principal = resolver.resolve(&credential_for(user.id)).await.unwrap();
        assert_eq!(principal.id, user.id);
        assert_eq!(principal.roles, vec![Role::ADMIN]);
        assert!(principal.is_active);
    }

    #[tokio::test]
    async fn unknown_subject_is_not_found() {
        let resolver = IdentityResolver::new(LookupStore::default());
        let err = resolver.resolve(&credential_for(UserId::new())).await.unwrap_err();
        assert_eq!(err, IdentityError::PrincipalNotFound);
    }

    #[tokio::test]
    async fn inactive_account_is_rejected() {
        let user = record(false);
        let resolver = IdentityResolver::new(LookupStore::with(user.clone()));
        let err = resolver.resolve(&credential_for(user.id)).await.unwrap_err();
        assert_eq!(err, IdentityError::PrincipalInactive);
    }

    #[tokio::test]
    async fn store_outage_is_not_an_authentication_verdict() {
        let resolver = IdentityResolver::new(LookupStore {
            offline: true,
            ..Default::default()
        });
        let err = resolver.resolve(&credential_for(UserId::new())).await.unwrap_err();
        assert!(matches!(err, IdentityError::Store(UserStoreError::Unavailable(_))));
    }
}
