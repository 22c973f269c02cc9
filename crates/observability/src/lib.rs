//! Tracing, logging and the operational-logger port (shared setup).

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Operational logger used for non-fatal failure reporting.
pub mod logging;

pub use logging::{LogLevel, OperationalEvent, OperationalLogger, TracingOperationalLogger};
pub use tracing::{LogFormat, ParseLogFormatError};

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}
