//! Operational logger: structured, correlation-tagged, fire-and-forget.
//!
//! Components report non-fatal failures (an audit write that did not land)
//! through this port instead of raising them. Implementations must never
//! panic or block the caller.

use std::sync::Arc;

use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationalEvent {
    pub level: LogLevel,
    pub correlation_id: String,
    /// Emitting component, e.g. `"pipeline"`.
    pub component: &'static str,
    pub message: String,
    /// Stable alert key for conditions that monitoring should page on.
    pub alert: Option<&'static str>,
}

impl OperationalEvent {
    pub fn new(level: LogLevel, correlation_id: impl Into<String>, component: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            correlation_id: correlation_id.into(),
            component,
            message: message.into(),
            alert: None,
        }
    }

    pub fn with_alert(mut self, alert: &'static str) -> Self {
        self.alert = Some(alert);
        self
    }
}

pub trait OperationalLogger: Send + Sync {
    fn log(&self, event: OperationalEvent);
}

impl<L> OperationalLogger for Arc<L>
where
    L: OperationalLogger + ?Sized,
{
    fn log(&self, event: OperationalEvent) {
        (**self).log(event)
    }
}

/// Forwards operational events to the process `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOperationalLogger;

impl OperationalLogger for TracingOperationalLogger {
    fn log(&self, event: OperationalEvent) {
        let alert = event.alert.unwrap_or("");
        match event.level {
            LogLevel::Info => ::tracing::info!(
                correlation_id = %event.correlation_id,
                component = event.component,
                alert,
                "{}",
                event.message
            ),
            LogLevel::Warn => ::tracing::warn!(
                correlation_id = %event.correlation_id,
                component = event.component,
                alert,
                "{}",
                event.message
            ),
            LogLevel::Error => ::tracing::error!(
                correlation_id = %event.correlation_id,
                component = event.component,
                alert,
                "{}",
                event.message
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_is_attached() {
        let event = OperationalEvent::new(LogLevel::Error, "req-9", "pipeline", "audit write failed")
            .with_alert("audit_write_failed");
        assert_eq!(event.alert, Some("audit_write_failed"));
        assert_eq!(event.correlation_id, "req-9");
    }

    #[test]
    fn tracing_logger_never_panics_without_subscriber() {
        TracingOperationalLogger.log(OperationalEvent::new(LogLevel::Warn, "c", "test", "hello"));
    }
}
