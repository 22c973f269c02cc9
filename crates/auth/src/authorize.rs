//! Role policy engine.
//!
//! Two independent checks gate every mutation:
//! - the generic role check ([`authorize`]) against an operation's statically
//!   declared required roles;
//! - the self-protection guards ([`SelfProtection`]) that keep lesser roles
//!   away from accounts holding, or about to hold, the privileged role.
//!
//! Both are pure: no IO, no panics.

use thiserror::Error;

use warden_core::UserId;

use crate::{Principal, Role, RoleCatalog};

/// Why an authorization check failed.
///
/// Carried role/target details are diagnostic only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Denial {
    #[error("no authenticated principal")]
    PrincipalMissing,

    #[error("principal {principal} is inactive")]
    PrincipalInactive { principal: UserId },

    #[error("principal {principal} needs one of the roles: [{}]", join_roles(.required))]
    InsufficientRole { principal: UserId, required: Vec<Role> },

    #[error("cannot modify or delete user {target}: it holds {role}")]
    CannotModifyPrivilegedAccount { target: UserId, role: Role },

    #[error("cannot grant the {role} role without holding it")]
    CannotGrantPrivilegedRole { role: Role },
}

fn join_roles(roles: &[Role]) -> String {
    roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial),
        }
    }
}

/// Statically declared role requirement of an operation.
///
/// An empty slice means the operation is public.
pub trait OperationPolicy {
    fn required_roles(&self) -> &[Role];
}

/// Generic role check.
///
/// Exact-match intersection: no role implies another.
pub fn authorize(principal: Option<&Principal>, required_roles: &[Role]) -> Decision {
    if required_roles.is_empty() {
        return Decision::Allow;
    }

    let Some(principal) = principal else {
        return Decision::Deny(Denial::PrincipalMissing);
    };

    if !principal.is_active {
        return Decision::Deny(Denial::PrincipalInactive {
            principal: principal.id,
        });
    }

    if principal.has_any_role(required_roles) {
        Decision::Allow
    } else {
        Decision::Deny(Denial::InsufficientRole {
            principal: principal.id,
            required: required_roles.to_vec(),
        })
    }
}

/// Self-protection guards around the privileged role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfProtection {
    privileged: Role,
}

impl SelfProtection {
    pub fn new(privileged: Role) -> Self {
        Self { privileged }
    }

    pub fn from_catalog(catalog: &RoleCatalog) -> Self {
        Self::new(catalog.privileged().clone())
    }

    pub fn privileged(&self) -> &Role {
        &self.privileged
    }

    fn actor_is_privileged(&self, actor: Option<&Principal>) -> bool {
        actor.is_some_and(|p| p.has_role(&self.privileged))
    }

    /// Edit/delete guard: a target holding the privileged role may only be
    /// touched by an actor holding it too, whatever else the actor holds.
    pub fn check_target(&self, actor: Option<&Principal>, target: UserId, target_roles: &[Role]) -> Decision {
        if target_roles.contains(&self.privileged) && !self.actor_is_privileged(actor) {
            return Decision::Deny(Denial::CannotModifyPrivilegedAccount {
                target,
                role: self.privileged.clone(),
            });
        }
        Decision::Allow
    }

    /// Create/elevate guard: only a privileged actor may hand out the
    /// privileged role.
    pub fn check_grant(&self, actor: Option<&Principal>, requested_roles: &[Role]) -> Decision {
        if requested_roles.contains(&self.privileged) && !self.actor_is_privileged(actor) {
            return Decision::Deny(Denial::CannotGrantPrivilegedRole {
                role: self.privileged.clone(),
            });
        }
        Decision::Allow
    }
}
