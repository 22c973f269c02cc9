//! `warden-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the request correlation context and the shared error model.

pub mod correlation;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use correlation::{CORRELATION_ID_HEADER, CorrelationContext, CorrelationError, CorrelationId};
pub use entity::{Auditable, Entity};
pub use error::{DomainError, DomainResult};
pub use id::{AuditEntryId, UserId};
pub use value_object::{Email, ValueObject};
