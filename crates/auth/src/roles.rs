use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use warden_core::DomainError;

/// Role identifier used for RBAC.
///
/// Roles are opaque upper-case tags at this layer. Which tags exist, and which
/// one is the top privilege, is decided by a [`RoleCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const SUPERADMIN: Role = Role(Cow::Borrowed("SUPERADMIN"));
    pub const ADMIN: Role = Role(Cow::Borrowed("ADMIN"));
    pub const USER: Role = Role(Cow::Borrowed("USER"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remove duplicate roles, keeping first-seen order.
pub fn dedup_roles(roles: impl IntoIterator<Item = Role>) -> Vec<Role> {
    let mut out: Vec<Role> = Vec::new();
    for role in roles {
        if !out.contains(&role) {
            out.push(role);
        }
    }
    out
}

/// The closed set of roles known to a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCatalog {
    roles: Vec<Role>,
    privileged: Role,
    default_role: Role,
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self {
            roles: vec![Role::SUPERADMIN, Role::ADMIN, Role::USER],
            privileged: Role::SUPERADMIN,
            default_role: Role::USER,
        }
    }
}

impl RoleCatalog {
    /// Build a catalog. The privileged and default roles must be members.
    pub fn new(roles: Vec<Role>, privileged: Role, default_role: Role) -> Result<Self, DomainError> {
        let roles = dedup_roles(roles.into_iter().map(|r| Role::new(r.as_str().trim().to_uppercase())));
        if roles.is_empty() {
            return Err(DomainError::validation("role catalog must not be empty"));
        }

        let privileged = Role::new(privileged.as_str().trim().to_uppercase());
        let default_role = Role::new(default_role.as_str().trim().to_uppercase());
        for required in [&privileged, &default_role] {
            if !roles.contains(required) {
                return Err(DomainError::unknown_role(required.as_str()));
            }
        }

        Ok(Self {
            roles,
            privileged,
            default_role,
        })
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// The top-privilege role protected by the self-protection guards.
    pub fn privileged(&self) -> &Role {
        &self.privileged
    }

    /// Role assigned to new accounts that request none.
    pub fn default_role(&self) -> &Role {
        &self.default_role
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Parse a role name (case-insensitive) against the catalog.
    pub fn parse(&self, name: &str) -> Result<Role, DomainError> {
        let candidate = Role::new(name.trim().to_uppercase());
        if self.contains(&candidate) {
            Ok(candidate)
        } else {
            Err(DomainError::unknown_role(name.trim()))
        }
    }

    /// Parse a list of role names, dropping duplicates.
    pub fn parse_all<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Role>, DomainError> {
        let parsed = names
            .iter()
            .map(|n| self.parse(n.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dedup_roles(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_closed() {
        let catalog = RoleCatalog::default();
        assert_eq!(catalog.parse("superadmin").unwrap(), Role::SUPERADMIN);
        assert_eq!(catalog.parse(" Admin ").unwrap(), Role::ADMIN);
        assert!(matches!(catalog.parse("root"), Err(DomainError::UnknownRole(ref r)) if r == "root"));
    }

    #[test]
    fn parse_all_removes_duplicates() {
        let catalog = RoleCatalog::default();
        let roles = catalog.parse_all(&["user", "USER", "admin"]).unwrap();
        assert_eq!(roles, vec![Role::USER, Role::ADMIN]);
    }

    #[test]
    fn catalog_requires_privileged_and_default_members() {
        let err = RoleCatalog::new(vec![Role::ADMIN, Role::USER], Role::SUPERADMIN, Role::USER).unwrap_err();
        assert_eq!(err, DomainError::unknown_role("SUPERADMIN"));

        let custom = RoleCatalog::new(
            vec![Role::new("owner"), Role::new("member")],
            Role::new("Owner"),
            Role::new("member"),
        )
        .unwrap();
        assert_eq!(custom.privileged().as_str(), "OWNER");
        assert_eq!(custom.default_role().as_str(), "MEMBER");
    }
}
