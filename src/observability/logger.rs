//! Subscriber installation
//!
//! Logs are written to stderr so that command output on stdout stays
//! machine-readable.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(String),
}

impl ObservabilityError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ObservabilityError::InvalidFilter { .. } => "AERO_LOG_INVALID_FILTER",
            ObservabilityError::AlreadyInstalled(_) => "AERO_LOG_ALREADY_INSTALLED",
        }
    }
}

/// Installs the global `tracing` subscriber.
///
/// `filter` is used unless `RUST_LOG` is set. With `json` each event is one
/// JSON line; otherwise the compact human-readable format is used.
pub fn init_tracing(filter: &str, json: bool) -> Result<(), ObservabilityError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => build_filter(filter)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    installed.map_err(|err| ObservabilityError::AlreadyInstalled(err.to_string()))
}

fn build_filter(filter: &str) -> Result<EnvFilter, ObservabilityError> {
    EnvFilter::try_new(filter).map_err(|err| ObservabilityError::InvalidFilter {
        filter: filter.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter() {
        assert!(build_filter("info").is_ok());
        assert!(build_filter("aeroquery=debug,warn").is_ok());

        let err = build_filter("aeroquery=loud").unwrap_err();
        assert_eq!(err.code(), "AERO_LOG_INVALID_FILTER");
    }

    #[test]
    fn test_second_install_is_reported() {
        // The first call may race with other tests installing a subscriber;
        // only the second outcome is deterministic.
        let _ = init_tracing("warn", false);
        let err = init_tracing("warn", false).unwrap_err();
        assert_eq!(err.code(), "AERO_LOG_ALREADY_INSTALLED");
    }
}
