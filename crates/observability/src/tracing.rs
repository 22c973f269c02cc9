//! Tracing/logging initialization.

use core::str::FromStr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Output format of the process log.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line (production default).
    #[default]
    Json,
    /// Multi-line human-readable output for local development.
    Pretty,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown log format '{0}' (expected 'json' or 'pretty')")]
pub struct ParseLogFormatError(pub String);

impl FromStr for LogFormat {
    type Err = ParseLogFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(ParseLogFormatError(other.to_string())),
        }
    }
}

/// Initialize tracing/logging for the process.
///
/// Filtering via `RUST_LOG` (default `info`). Safe to call multiple times
/// (subsequent calls are no-ops).
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .with_target(false)
            .try_init(),
    };
}
