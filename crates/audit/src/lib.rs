//! `warden-audit`: append-only audit trail.
//!
//! Entries are immutable facts about a mutation: who did what to which entity,
//! and the entity's state before and after.

pub mod entry;
pub mod in_memory;
pub mod recorder;
pub mod store;

pub use entry::{AuditAction, AuditEntry, StateSnapshot};
pub use in_memory::InMemoryAuditStore;
pub use recorder::{AuditError, AuditRecord, AuditRecorder};
pub use store::{AuditStore, AuditStoreError};
