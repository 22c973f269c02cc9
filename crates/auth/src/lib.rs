//! `warden-auth`: authentication/authorization boundary.
//!
//! Identity resolution, the role policy engine and the user-store port.
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod identity;
pub mod password;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{Decision, Denial, OperationPolicy, SelfProtection, authorize};
pub use claims::{CredentialError, CredentialValidator, TokenValidationError, ValidatedCredential, validate_claims};
pub use identity::{IdentityError, IdentityResolver};
pub use password::{Argon2PasswordHasher, PasswordHash, PasswordHashError, PasswordHasher};
pub use principal::Principal;
pub use roles::{Role, RoleCatalog, dedup_roles};
pub use user::{NewUser, UserChanges, UserRecord, UserSnapshot, UserStore, UserStoreError, UserView};
