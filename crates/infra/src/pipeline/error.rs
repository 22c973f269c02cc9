//! Pipeline error taxonomy.
//!
//! Component errors are classified here and nowhere else: every lower-level
//! failure becomes either a [`Rejection`] (the request was not allowed) or a
//! [`Failure`] (it was allowed but could not be carried out).

use thiserror::Error;

use warden_auth::{CredentialError, Denial, IdentityError, PasswordHashError, Role, UserStoreError};
use warden_core::UserId;

use super::PipelineStage;

fn join_roles(roles: &[Role]) -> String {
    roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
}

/// The request was refused before any mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token has expired")]
    ExpiredToken,

    #[error("principal not found")]
    PrincipalNotFound,

    #[error("principal is inactive")]
    PrincipalInactive,

    #[error("authentication required")]
    PrincipalMissing,

    #[error("one of the roles [{}] is required", join_roles(.required))]
    InsufficientRole { required: Vec<Role> },

    #[error("cannot modify or delete user {target}: it holds {role}")]
    CannotModifyPrivilegedAccount { target: UserId, role: Role },

    #[error("cannot grant the {role} role without holding it")]
    CannotGrantPrivilegedRole { role: Role },

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("invalid roles: {0}")]
    InvalidRoles(String),
}

impl Rejection {
    pub fn reason_code(&self) -> &'static str {
        match self {
            Rejection::InvalidToken(_) => "invalid_token",
            Rejection::ExpiredToken => "expired_token",
            Rejection::PrincipalNotFound => "principal_not_found",
            Rejection::PrincipalInactive => "principal_inactive",
            Rejection::PrincipalMissing => "principal_missing",
            Rejection::InsufficientRole { .. } => "insufficient_role",
            Rejection::CannotModifyPrivilegedAccount { .. } => "cannot_modify_privileged_account",
            Rejection::CannotGrantPrivilegedRole { .. } => "cannot_grant_privileged_role",
            Rejection::PasswordMismatch => "password_mismatch",
            Rejection::InvalidRoles(_) => "invalid_roles",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Rejection::InvalidToken(_)
            | Rejection::ExpiredToken
            | Rejection::PrincipalNotFound
            | Rejection::PrincipalInactive => ErrorCategory::Authentication,
            Rejection::PrincipalMissing
            | Rejection::InsufficientRole { .. }
            | Rejection::CannotModifyPrivilegedAccount { .. }
            | Rejection::CannotGrantPrivilegedRole { .. } => ErrorCategory::Authorization,
            Rejection::PasswordMismatch | Rejection::InvalidRoles(_) => ErrorCategory::Validation,
        }
    }
}

/// The request was allowed but the business step did not complete.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Failure {
    #[error("user {key} not found")]
    NotFound { key: String },

    #[error("user {value} already exists")]
    AlreadyExists { field: &'static str, value: String },

    /// The target changed between the authorization checks and the write.
    #[error("user {key} was modified concurrently; retry the request")]
    ConcurrentModification { key: String },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Failure {
    pub fn reason_code(&self) -> &'static str {
        match self {
            Failure::NotFound { .. } => "not_found",
            Failure::AlreadyExists { .. } => "already_exists",
            Failure::ConcurrentModification { .. } => "concurrent_modification",
            Failure::StoreUnavailable(_) => "store_unavailable",
            Failure::Internal(_) => "internal",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Failure::NotFound { .. } => ErrorCategory::NotFound,
            Failure::AlreadyExists { .. } => ErrorCategory::Conflict,
            Failure::ConcurrentModification { .. } => ErrorCategory::Concurrency,
            Failure::StoreUnavailable(_) | Failure::Internal(_) => ErrorCategory::Infrastructure,
        }
    }
}

/// Coarse class of an error, for transport-level mapping.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Authorization,
    Validation,
    NotFound,
    Conflict,
    Concurrency,
    Infrastructure,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("failed: {0}")]
    Failed(#[from] Failure),
}

impl PipelineError {
    /// Stable snake_case code for clients and logs.
    pub fn reason_code(&self) -> &'static str {
        match self {
            PipelineError::Rejected(r) => r.reason_code(),
            PipelineError::Failed(f) => f.reason_code(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::Rejected(r) => r.category(),
            PipelineError::Failed(f) => f.category(),
        }
    }

    /// Absorbing stage the request ended in.
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Rejected(_) => PipelineStage::Rejected,
            PipelineError::Failed(_) => PipelineStage::Failed,
        }
    }

    pub fn not_found(key: impl ToString) -> Self {
        PipelineError::Failed(Failure::NotFound { key: key.to_string() })
    }
}

impl From<Denial> for Rejection {
    fn from(value: Denial) -> Self {
        match value {
            Denial::PrincipalMissing => Rejection::PrincipalMissing,
            Denial::PrincipalInactive { .. } => Rejection::PrincipalInactive,
            Denial::InsufficientRole { required, .. } => Rejection::InsufficientRole { required },
            Denial::CannotModifyPrivilegedAccount { target, role } => {
                Rejection::CannotModifyPrivilegedAccount { target, role }
            }
            Denial::CannotGrantPrivilegedRole { role } => Rejection::CannotGrantPrivilegedRole { role },
        }
    }
}

impl From<Denial> for PipelineError {
    fn from(value: Denial) -> Self {
        PipelineError::Rejected(value.into())
    }
}

impl From<CredentialError> for Rejection {
    fn from(value: CredentialError) -> Self {
        match value {
            CredentialError::InvalidToken(msg) => Rejection::InvalidToken(msg),
            CredentialError::ExpiredToken => Rejection::ExpiredToken,
        }
    }
}

impl From<CredentialError> for PipelineError {
    fn from(value: CredentialError) -> Self {
        PipelineError::Rejected(value.into())
    }
}

impl From<UserStoreError> for Failure {
    fn from(value: UserStoreError) -> Self {
        match value {
            UserStoreError::Duplicate { field, value } => Failure::AlreadyExists { field, value },
            UserStoreError::NotFound(id) => Failure::NotFound { key: id.to_string() },
            UserStoreError::VersionConflict { id, .. } => Failure::ConcurrentModification { key: id.to_string() },
            UserStoreError::Unavailable(msg) => Failure::StoreUnavailable(msg),
        }
    }
}

impl From<UserStoreError> for PipelineError {
    fn from(value: UserStoreError) -> Self {
        PipelineError::Failed(value.into())
    }
}

impl From<IdentityError> for PipelineError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::PrincipalNotFound => Rejection::PrincipalNotFound.into(),
            IdentityError::PrincipalInactive => Rejection::PrincipalInactive.into(),
            IdentityError::Store(err) => err.into(),
        }
    }
}

impl From<PasswordHashError> for Failure {
    fn from(value: PasswordHashError) -> Self {
        Failure::Internal(value.to_string())
    }
}
