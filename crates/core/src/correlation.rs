//! Per-request correlation context.
//!
//! A correlation id ties one request's authentication decision, business
//! operation and audit entry together. It is generated once (or adopted from
//! the caller) and then only read.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header carrying a caller-supplied correlation id.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    /// The OS entropy source could not produce bytes for a fresh id.
    #[error("entropy source unavailable: {0}")]
    EntropyUnavailable(String),
}

/// Opaque correlation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a fresh random (v4-layout) UUID id.
    ///
    /// Fails closed: if the entropy source is unavailable no id is produced.
    pub fn generate() -> Result<Self, CorrelationError> {
        let mut bytes = [0u8; 16];
        getrandom::getrandom(&mut bytes)
            .map_err(|e| CorrelationError::EntropyUnavailable(e.to_string()))?;
        let uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
        Ok(Self(uuid.to_string()))
    }

    /// Wrap a caller-supplied value without altering it.
    pub fn from_caller(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request-scoped holder of the correlation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationContext {
    id: CorrelationId,
    generated: bool,
}

impl CorrelationContext {
    /// Adopt the supplied header value unchanged, or generate a new id when the
    /// header is missing or blank.
    pub fn from_header(supplied: Option<&str>) -> Result<Self, CorrelationError> {
        match supplied {
            Some(value) if !value.trim().is_empty() => Ok(Self {
                id: CorrelationId::from_caller(value),
                generated: false,
            }),
            _ => Self::generate(),
        }
    }

    pub fn generate() -> Result<Self, CorrelationError> {
        let id = CorrelationId::generate()?;
        tracing::trace!(correlation_id = %id, "generated correlation id");
        Ok(Self { id, generated: true })
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.id
    }

    /// Whether the id was minted here rather than supplied by the caller.
    pub fn was_generated(&self) -> bool {
        self.generated
    }
}
