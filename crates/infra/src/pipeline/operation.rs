//! Operation definitions and their statically declared role requirements.

use core::fmt;

use serde::Serialize;

use warden_audit::AuditAction;
use warden_auth::{OperationPolicy, Role};
use warden_core::{Email, UserId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Update,
    Deactivate,
    Delete,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Create,
        OperationKind::Update,
        OperationKind::Deactivate,
        OperationKind::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Deactivate => "deactivate",
            OperationKind::Delete => "delete",
        }
    }

    pub fn audit_action(&self) -> AuditAction {
        match self {
            OperationKind::Create => AuditAction::Create,
            OperationKind::Update => AuditAction::Update,
            OperationKind::Deactivate => AuditAction::Deactivate,
            OperationKind::Delete => AuditAction::Delete,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input of a create. `roles: None` means the catalog's default role.
#[derive(Clone, PartialEq, Eq)]
pub struct CreateUser {
    pub name: String,
    pub lastname: String,
    pub email: Email,
    pub password: String,
    pub confirm_password: String,
    pub roles: Option<Vec<Role>>,
}

impl fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUser")
            .field("name", &self.name)
            .field("lastname", &self.lastname)
            .field("email", &self.email)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

/// Input of an update. Absent fields stay unchanged; a password change needs
/// both password fields.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<Email>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub roles: Option<Vec<Role>>,
    pub is_active: Option<bool>,
}

impl fmt::Debug for UpdateUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateUser")
            .field("name", &self.name)
            .field("lastname", &self.lastname)
            .field("email", &self.email)
            .field("password_change", &(self.password.is_some() || self.confirm_password.is_some()))
            .field("roles", &self.roles)
            .field("is_active", &self.is_active)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserOperation {
    Create(CreateUser),
    Update { target: UserId, changes: UpdateUser },
    /// Sets `is_active = false`; repeating it is not an error.
    Deactivate { target: UserId },
    Delete { target: UserId },
}

impl UserOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            UserOperation::Create(_) => OperationKind::Create,
            UserOperation::Update { .. } => OperationKind::Update,
            UserOperation::Deactivate { .. } => OperationKind::Deactivate,
            UserOperation::Delete { .. } => OperationKind::Delete,
        }
    }

    pub fn target(&self) -> Option<UserId> {
        match self {
            UserOperation::Create(_) => None,
            UserOperation::Update { target, .. }
            | UserOperation::Deactivate { target }
            | UserOperation::Delete { target } => Some(*target),
        }
    }
}

/// Roles any one of which satisfies an operation. Empty means public.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredRoles(Vec<Role>);

impl RequiredRoles {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self(warden_auth::dedup_roles(roles))
    }

    pub fn public() -> Self {
        Self::default()
    }

    pub fn is_public(&self) -> bool {
        self.0.is_empty()
    }
}

impl OperationPolicy for RequiredRoles {
    fn required_roles(&self) -> &[Role] {
        &self.0
    }
}

/// Required roles per operation kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationPolicies {
    create: RequiredRoles,
    update: RequiredRoles,
    deactivate: RequiredRoles,
    delete: RequiredRoles,
}

impl Default for OperationPolicies {
    fn default() -> Self {
        Self::uniform(RequiredRoles::new([Role::SUPERADMIN, Role::ADMIN]))
    }
}

impl OperationPolicies {
    pub fn uniform(required: RequiredRoles) -> Self {
        Self {
            create: required.clone(),
            update: required.clone(),
            deactivate: required.clone(),
            delete: required,
        }
    }

    pub fn with(mut self, kind: OperationKind, required: RequiredRoles) -> Self {
        *self.slot_mut(kind) = required;
        self
    }

    pub fn for_kind(&self, kind: OperationKind) -> &RequiredRoles {
        match kind {
            OperationKind::Create => &self.create,
            OperationKind::Update => &self.update,
            OperationKind::Deactivate => &self.deactivate,
            OperationKind::Delete => &self.delete,
        }
    }

    fn slot_mut(&mut self, kind: OperationKind) -> &mut RequiredRoles {
        match kind {
            OperationKind::Create => &mut self.create,
            OperationKind::Update => &mut self.update,
            OperationKind::Deactivate => &mut self.deactivate,
            OperationKind::Delete => &mut self.delete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_require_admin_or_superadmin_everywhere() {
        let policies = OperationPolicies::default();
        for kind in OperationKind::ALL {
            assert_eq!(policies.for_kind(kind).required_roles(), &[Role::SUPERADMIN, Role::ADMIN]);
        }
    }

    #[test]
    fn one_kind_can_be_overridden() {
        let policies = OperationPolicies::default().with(OperationKind::Create, RequiredRoles::public());
        assert!(policies.for_kind(OperationKind::Create).is_public());
        assert!(!policies.for_kind(OperationKind::Delete).is_public());
    }

    #[test]
    fn debug_output_never_contains_passwords() {
        let create = CreateUser {
            name: "Richard".into(),
            lastname: "Kendy".into(),
            email: Email::parse("richard@gmail.com").unwrap(),
            password: "Test123##".into(),
            confirm_password: "Test123##".into(),
            roles: None,
        };
        let update = UpdateUser {
            password: Some("Test123##".into()),
            confirm_password: Some("Test123##".into()),
            ..Default::default()
        };

        assert!(!format!("{create:?}").contains("Test123##"));
        assert!(!format!("{update:?}").contains("Test123##"));
    }

    #[test]
    fn kinds_map_to_audit_actions() {
        assert_eq!(OperationKind::Deactivate.audit_action(), AuditAction::Deactivate);
        assert_eq!(
            UserOperation::Delete { target: UserId::new() }.kind().audit_action(),
            AuditAction::Delete
        );
    }
}
