//! Index metadata errors
//!
//! Parse errors abort a refresh; the previously published snapshot stays
//! current. An unreachable cluster is not an error (see `IndexRefresher`).

use thiserror::Error;

use crate::store::StoreError;

/// Result type for index metadata operations
pub type IndexResult<T> = Result<T, IndexError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("malformed index entry '{entry}': missing required key '{key}'")]
    MissingKey { entry: String, key: &'static str },

    #[error("malformed index entry '{entry}': field '{field}' is not key=value")]
    MalformedField { entry: String, field: String },

    #[error("index DDL failed: {0}")]
    Ddl(#[from] StoreError),
}

impl IndexError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::MissingKey { .. } | IndexError::MalformedField { .. } => {
                "AERO_INDEX_PARSE"
            }
            IndexError::Ddl(_) => "AERO_INDEX_DDL_FAILED",
        }
    }

    /// Returns true if the info response could not be parsed
    pub fn is_parse_error(&self) -> bool {
        self.code() == "AERO_INDEX_PARSE"
    }
}
