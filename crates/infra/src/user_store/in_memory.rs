use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use warden_auth::{NewUser, UserChanges, UserRecord, UserStore, UserStoreError};
use warden_core::{Email, UserId};

/// In-memory user store for tests/dev.
///
/// Each call takes the lock once, so the uniqueness check and the write are
/// atomic with respect to other calls. Users are kept in creation order.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> UserStoreError {
    UserStoreError::Unavailable("lock poisoned".to_string())
}

fn check_version(record: &UserRecord, expected: u64) -> Result<(), UserStoreError> {
    if record.version != expected {
        return Err(UserStoreError::VersionConflict {
            id: record.id,
            expected,
            actual: record.version,
        });
    }
    Ok(())
}

fn duplicate_email(email: &Email) -> UserStoreError {
    UserStoreError::Duplicate {
        field: "email",
        value: email.to_string(),
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, UserStoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, UserStoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.iter().find(|u| &u.email == email).cloned())
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<UserRecord>, UserStoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, UserStoreError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;

        if users.iter().any(|u| u.email == user.email) {
            return Err(duplicate_email(&user.email));
        }
        if users.iter().any(|u| u.id == user.id) {
            return Err(UserStoreError::Duplicate {
                field: "id",
                value: user.id.to_string(),
            });
        }

        let now = Utc::now();
        let record = UserRecord {
            id: user.id,
            name: user.name,
            lastname: user.lastname,
            email: user.email,
            password_hash: user.password_hash,
            roles: user.roles,
            is_active: user.is_active,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: UserId,
        expected_version: u64,
        changes: UserChanges,
    ) -> Result<UserRecord, UserStoreError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;

        if let Some(email) = &changes.email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(duplicate_email(email));
            }
        }

        let record = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(UserStoreError::NotFound(id))?;
        check_version(record, expected_version)?;
        changes.apply_to(record);
        record.updated_at = Utc::now();
        record.version += 1;
        Ok(record.clone())
    }

    async fn delete(&self, id: UserId, expected_version: u64) -> Result<UserRecord, UserStoreError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        let idx = users
            .iter()
            .position(|u| u.id == id)
            .ok_or(UserStoreError::NotFound(id))?;
        check_version(&users[idx], expected_version)?;
        Ok(users.remove(idx))
    }
}
