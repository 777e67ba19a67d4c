//! Statement compilation errors
//!
//! Error codes:
//! - AERO_QUERY_MALFORMED
//! - AERO_QUERY_UNSUPPORTED_OPERAND
//! - AERO_QUERY_KEY_NOT_ALONE
//! - AERO_QUERY_EMPTY_STATEMENT

use thiserror::Error;

use crate::qualifier::{FilterOperation, QualifierError};

/// Result type for statement compilation
pub type CompilerResult<T> = Result<T, CompilerError>;

/// A qualifier list could not be compiled into a plan
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilerError {
    #[error("malformed qualifier: {0}")]
    Malformed(#[from] QualifierError),

    #[error("{operation} on field '{field}' cannot be evaluated: {reason}")]
    UnsupportedOperand {
        field: String,
        operation: FilterOperation,
        reason: String,
    },

    #[error("a key qualifier must be the only top-level qualifier")]
    KeyQualifierNotAlone,

    #[error("statement on {namespace}/{} has neither qualifiers nor an index filter", .set.as_deref().unwrap_or("*"))]
    EmptyStatement {
        namespace: String,
        set: Option<String>,
    },
}

impl CompilerError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CompilerError::Malformed(_) => "AERO_QUERY_MALFORMED",
            CompilerError::UnsupportedOperand { .. } => "AERO_QUERY_UNSUPPORTED_OPERAND",
            CompilerError::KeyQualifierNotAlone => "AERO_QUERY_KEY_NOT_ALONE",
            CompilerError::EmptyStatement { .. } => "AERO_QUERY_EMPTY_STATEMENT",
        }
    }
}
