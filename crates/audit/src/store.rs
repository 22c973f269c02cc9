use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::AuditEntry;

/// Audit store operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditStoreError {
    /// The backend could not be reached or did not acknowledge the write.
    #[error("audit store unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the entry (e.g. an id collision).
    #[error("audit entry rejected: {0}")]
    Rejected(String),
}

/// Append-only audit store.
///
/// There is deliberately no read, update or delete method: querying the trail
/// is a reporting concern and retention is handled out of band.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> Result<(), AuditStoreError>;
}

#[async_trait]
impl<S> AuditStore for Arc<S>
where
    S: AuditStore + ?Sized,
{
    async fn append(&self, entry: AuditEntry) -> Result<(), AuditStoreError> {
        (**self).append(entry).await
    }
}
