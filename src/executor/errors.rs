//! Query execution errors
//!
//! Error codes:
//! - AERO_QUERY_UNSAFE_FULL_SCAN
//! - compiler and store codes, passed through unchanged

use thiserror::Error;

use crate::planner::CompilerError;
use crate::store::StoreError;

/// Result type for query execution
pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// No index filter and full scans are disabled; raised before any request
    #[error("query on {namespace}/{} needs a full scan and scans are disabled", .set.as_deref().unwrap_or("*"))]
    UnsafeFullScan {
        namespace: String,
        set: Option<String>,
    },

    #[error(transparent)]
    Compiler(#[from] CompilerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::UnsafeFullScan { .. } => "AERO_QUERY_UNSAFE_FULL_SCAN",
            QueryError::Compiler(err) => err.code(),
            QueryError::Store(err) => err.code(),
        }
    }
}
