//! User accounts as seen through the user-store port.
//!
//! The store itself is an external collaborator; this module fixes the record
//! shape, the change set applied by updates, and the snapshot that is allowed
//! into the audit trail.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_core::{Auditable, Email, Entity, UserId};

use crate::{PasswordHash, Principal, Role};

// ─────────────────────────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────────────────────────

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub lastname: String,
    pub email: Email,
    pub password_hash: PasswordHash,
    pub roles: Vec<Role>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Starts at 1 and increases with every committed update. Conditional
    /// writes compare against it.
    pub version: u64,
}

impl UserRecord {
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// The acting principal for this account.
    pub fn to_principal(&self) -> Principal {
        Principal {
            id: self.id,
            email: self.email.clone(),
            roles: self.roles.clone(),
            is_active: self.is_active,
        }
    }
}

impl Entity for UserRecord {
    type Id = UserId;

    const ENTITY_TYPE: &'static str = "user";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Audit-safe view of a user: every field except the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: UserId,
    pub name: String,
    pub lastname: String,
    pub email: Email,
    pub roles: Vec<Role>,
    pub is_active: bool,
}

impl Auditable for UserRecord {
    type Snapshot = UserSnapshot;

    fn snapshot(&self) -> Self::Snapshot {
        UserSnapshot {
            id: self.id,
            name: self.name.clone(),
            lastname: self.lastname.clone(),
            email: self.email.clone(),
            roles: self.roles.clone(),
            is_active: self.is_active,
        }
    }
}

/// Response representation of a user (no password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub lastname: String,
    pub email: Email,
    pub roles: Vec<Role>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserView {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            lastname: record.lastname.clone(),
            email: record.email.clone(),
            roles: record.roles.clone(),
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Data for a new account. The password is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub id: UserId,
    pub name: String,
    pub lastname: String,
    pub email: Email,
    pub password_hash: PasswordHash,
    pub roles: Vec<Role>,
    pub is_active: bool,
}

/// Partial update of an account. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<Email>,
    pub password_hash: Option<PasswordHash>,
    pub roles: Option<Vec<Role>>,
    pub is_active: Option<bool>,
}

impl UserChanges {
    pub fn deactivate() -> Self {
        Self {
            is_active: Some(false),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the change set to a record (does not touch timestamps).
    pub fn apply_to(&self, record: &mut UserRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(lastname) = &self.lastname {
            record.lastname = lastname.clone();
        }
        if let Some(email) = &self.email {
            record.email = email.clone();
        }
        if let Some(hash) = &self.password_hash {
            record.password_hash = hash.clone();
        }
        if let Some(roles) = &self.roles {
            record.roles = roles.clone();
        }
        if let Some(active) = self.is_active {
            record.is_active = active;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store port
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserStoreError {
    /// A uniqueness constraint rejected the write before commit.
    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    #[error("user {0} not found")]
    NotFound(UserId),

    /// The record changed after the caller read it.
    #[error("user {id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict { id: UserId, expected: u64, actual: u64 },

    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// User store collaborator.
///
/// Implementations provide their own atomicity per call; the pipeline relies on
/// it rather than adding locks of its own. `update` and `delete` only apply
/// while the record is still at `expected_version`, so a check made against
/// a read cannot be invalidated by a write that lands in between.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, UserStoreError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, UserStoreError>;

    /// Page through users in creation order.
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<UserRecord>, UserStoreError>;

    async fn create(&self, user: NewUser) -> Result<UserRecord, UserStoreError>;

    async fn update(
        &self,
        id: UserId,
        expected_version: u64,
        changes: UserChanges,
    ) -> Result<UserRecord, UserStoreError>;

    /// Remove the account, returning its last state.
    async fn delete(&self, id: UserId, expected_version: u64) -> Result<UserRecord, UserStoreError>;
}

#[async_trait]
impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, UserStoreError> {
        (**self).find_by_id(id).await
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, UserStoreError> {
        (**self).find_by_email(email).await
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<UserRecord>, UserStoreError> {
        (**self).list(limit, offset).await
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, UserStoreError> {
        (**self).create(user).await
    }

    async fn update(
        &self,
        id: UserId,
        expected_version: u64,
        changes: UserChanges,
    ) -> Result<UserRecord, UserStoreError> {
        (**self).update(id, expected_version, changes).await
    }

    async fn delete(&self, id: UserId, expected_version: u64) -> Result<UserRecord, UserStoreError> {
        (**self).delete(id, expected_version).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: UserId::new(),
            name: "Richard".to_string(),
            lastname: "Kendy".to_string(),
            email: Email::parse("richard@gmail.com").unwrap(),
            password_hash: PasswordHash::from_phc("$argon2id$v=19$m=64,t=1,p=1$c2FsdA$aGFzaA"),
            roles: vec![Role::USER],
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    #[test]
    fn snapshot_never_carries_the_password_hash() {
        let user = record();
        let json = serde_json::to_value(user.snapshot()).unwrap();

        assert_eq!(json["email"], "richard@gmail.com");
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn changes_only_touch_present_fields() {
        let mut user = record();
        let changes = UserChanges {
            lastname: Some("Smith".to_string()),
            roles: Some(vec![Role::ADMIN]),
            ..Default::default()
        };
        changes.apply_to(&mut user);

        assert_eq!(user.name, "Richard");
        assert_eq!(user.lastname, "Smith");
        assert_eq!(user.roles, vec![Role::ADMIN]);
        assert!(user.is_active);
    }

    #[test]
    fn deactivate_change_set() {
        let changes = UserChanges::deactivate();
        assert!(!changes.is_empty());
        assert!(UserChanges::default().is_empty());

        let mut user = record();
        changes.apply_to(&mut user);
        assert!(!user.is_active);
    }

    #[test]
    fn entity_type_tag() {
        assert_eq!(<UserRecord as Entity>::ENTITY_TYPE, "user");
    }
}
