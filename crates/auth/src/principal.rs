use serde::{Deserialize, Serialize};

use warden_core::{Email, UserId};

use crate::Role;

/// A fully resolved principal for authorization decisions.
///
/// Built per request by the identity resolver from a validated credential and
/// never persisted here; the user store owns the underlying account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub email: Email,
    pub roles: Vec<Role>,
    pub is_active: bool,
}

impl Principal {
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.has_role(r))
    }
}
