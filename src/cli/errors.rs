//! CLI-specific error types
//!
//! All CLI errors are fatal: the binary prints them and exits non-zero.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::executor::QueryError;
use crate::index::IndexError;
use crate::observability::ObservabilityError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    InvalidInput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Logging(#[from] ObservabilityError),
}

impl CliError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Read { .. } => "AERO_CLI_IO_ERROR",
            CliError::InvalidInput { .. } => "AERO_CLI_INVALID_INPUT",
            CliError::Output(_) => "AERO_CLI_IO_ERROR",
            CliError::Config(err) => err.code(),
            CliError::Index(err) => err.code(),
            CliError::Query(err) => err.code(),
            CliError::Logging(err) => err.code(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(io::Error::new(io::ErrorKind::Other, err))
    }
}
