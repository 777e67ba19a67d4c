//! Transport errors surfaced by store collaborators
//!
//! These propagate unchanged through the query engine; retry policy
//! belongs to the transport layer.

use std::time::Duration;

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by the record store, cluster or index admin
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("node {node} unreachable: {reason}")]
    Unreachable { node: String, reason: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("server error {code}: {message}")]
    Server { code: i32, message: String },

    #[error("cursor already closed")]
    CursorClosed,
}

impl StoreError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Unreachable { .. } => "AERO_STORE_UNREACHABLE",
            StoreError::Timeout(_) => "AERO_STORE_TIMEOUT",
            StoreError::Server { .. } => "AERO_STORE_SERVER_ERROR",
            StoreError::CursorClosed => "AERO_STORE_CURSOR_CLOSED",
        }
    }
}
