use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use warden_core::{AuditEntryId, Auditable, CorrelationId, UserId};

/// Kind of mutation an audit entry records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Deactivate,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Deactivate => "DEACTIVATE",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Captured entity state.
///
/// Only constructible from an [`Auditable`] entity's dedicated snapshot type,
/// so whatever that type leaves out (password hashes) never lands here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot(JsonValue);

impl StateSnapshot {
    pub fn capture<T: Auditable>(entity: &T) -> Result<Self, serde_json::Error> {
        Ok(Self(serde_json::to_value(entity.snapshot())?))
    }

    pub fn as_json(&self) -> &JsonValue {
        &self.0
    }
}

/// Immutable audit record.
///
/// Notes:
/// - **Append-only**: there is no setter; stores only ever append these.
/// - `actor_id` is `None` only for anonymous calls to public operations and
///   for the bootstrap account.
/// - `correlation_id` is the request's id, never regenerated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    id: AuditEntryId,
    entity_type: String,
    entity_id: String,
    action: AuditAction,
    actor_id: Option<UserId>,
    before_state: Option<StateSnapshot>,
    after_state: Option<StateSnapshot>,
    timestamp: DateTime<Utc>,
    correlation_id: CorrelationId,
}

impl AuditEntry {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: AuditEntryId,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        action: AuditAction,
        actor_id: Option<UserId>,
        before_state: Option<StateSnapshot>,
        after_state: Option<StateSnapshot>,
        timestamp: DateTime<Utc>,
        correlation_id: CorrelationId,
    ) -> Self {
        Self {
            id,
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            action,
            actor_id,
            before_state,
            after_state,
            timestamp,
            correlation_id,
        }
    }

    pub fn id(&self) -> AuditEntryId {
        self.id
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn action(&self) -> AuditAction {
        self.action
    }

    pub fn actor_id(&self) -> Option<UserId> {
        self.actor_id
    }

    pub fn before_state(&self) -> Option<&StateSnapshot> {
        self.before_state.as_ref()
    }

    pub fn after_state(&self) -> Option<&StateSnapshot> {
        self.after_state.as_ref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }
}
