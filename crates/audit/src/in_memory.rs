//! In-memory audit store for tests/dev.

use std::sync::RwLock;

use async_trait::async_trait;

use warden_core::CorrelationId;

use crate::{AuditEntry, AuditStore, AuditStoreError};

/// In-memory append-only audit store.
///
/// Read helpers exist for tests and local inspection; they are not part of the
/// [`AuditStore`] contract.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in append order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn for_correlation(&self, correlation_id: &CorrelationId) -> Vec<AuditEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.correlation_id() == correlation_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, entry: AuditEntry) -> Result<(), AuditStoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AuditStoreError::Unavailable("lock poisoned".to_string()))?;

        if entries.iter().any(|e| e.id() == entry.id()) {
            return Err(AuditStoreError::Rejected(format!("duplicate audit entry id {}", entry.id())));
        }

        entries.push(entry);
        Ok(())
    }
}
