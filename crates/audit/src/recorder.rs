//! Audit recorder: turns a known mutation outcome into an appended entry.

use chrono::Utc;
use thiserror::Error;

use warden_core::{AuditEntryId, Auditable, CorrelationId, Entity, UserId};

use crate::{AuditAction, AuditEntry, AuditStore, AuditStoreError, StateSnapshot};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("audit store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("state snapshot could not be captured: {0}")]
    Snapshot(String),

    #[error("an audit record needs a before or an after state")]
    MissingState,
}

impl From<AuditStoreError> for AuditError {
    fn from(value: AuditStoreError) -> Self {
        AuditError::StoreUnavailable(value.to_string())
    }
}

/// What happened, before it is stamped with an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub entity_type: String,
    pub entity_id: String,
    pub action: AuditAction,
    pub actor_id: Option<UserId>,
    pub before: Option<StateSnapshot>,
    pub after: Option<StateSnapshot>,
    pub correlation_id: CorrelationId,
}

impl AuditRecord {
    /// Build a record from typed entity states.
    ///
    /// The entity id is taken from the after state when present (creates),
    /// otherwise from the before state (deletes).
    pub fn capture<T: Auditable>(
        action: AuditAction,
        actor_id: Option<UserId>,
        before: Option<&T>,
        after: Option<&T>,
        correlation_id: CorrelationId,
    ) -> Result<Self, AuditError> {
        let entity_id = after
            .or(before)
            .map(|e| Entity::id(e).to_string())
            .ok_or(AuditError::MissingState)?;

        let snapshot = |state: Option<&T>| -> Result<Option<StateSnapshot>, AuditError> {
            state
                .map(StateSnapshot::capture)
                .transpose()
                .map_err(|e| AuditError::Snapshot(e.to_string()))
        };

        Ok(Self {
            entity_type: T::ENTITY_TYPE.to_string(),
            entity_id,
            action,
            actor_id,
            before: snapshot(before)?,
            after: snapshot(after)?,
            correlation_id,
        })
    }
}

/// Stamps records and appends them to the audit store.
#[derive(Debug)]
pub struct AuditRecorder<S> {
    store: S,
}

impl<S> AuditRecorder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> AuditRecorder<S>
where
    S: AuditStore,
{
    /// Persist one entry. Callers invoke this only once the mutation outcome
    /// is known; a failure here never undoes that mutation.
    pub async fn record(&self, record: AuditRecord) -> Result<AuditEntry, AuditError> {
        let entry = AuditEntry::new(
            AuditEntryId::new(),
            record.entity_type,
            record.entity_id,
            record.action,
            record.actor_id,
            record.before,
            record.after,
            Utc::now(),
            record.correlation_id,
        );

        self.store.append(entry.clone()).await?;

        tracing::debug!(
            correlation_id = %entry.correlation_id(),
            audit_entry_id = %entry.id(),
            action = %entry.action(),
            entity_type = entry.entity_type(),
            entity_id = entry.entity_id(),
            "audit entry recorded"
        );

        Ok(entry)
    }
}
