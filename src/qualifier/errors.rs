//! Qualifier construction errors

use thiserror::Error;

use super::operation::FilterOperation;

/// Result type for qualifier construction
pub type QualifierResult<T> = Result<T, QualifierError>;

/// A qualifier violates a structural invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QualifierError {
    #[error("{0} qualifier has an empty field name")]
    EmptyField(FilterOperation),

    #[error("{operation} on field '{field}' expects {expected} operand(s), got {actual}")]
    Arity {
        field: String,
        operation: FilterOperation,
        expected: usize,
        actual: usize,
    },

    #[error("composite operation {operation} cannot target field '{field}'")]
    CompositeOnField {
        field: String,
        operation: FilterOperation,
    },

    #[error("{0} qualifier requires at least one child")]
    EmptyComposite(FilterOperation),

    #[error("key qualifier has a null key")]
    NullKey,
}

impl QualifierError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QualifierError::EmptyField(_) => "AERO_QUALIFIER_EMPTY_FIELD",
            QualifierError::Arity { .. } => "AERO_QUALIFIER_ARITY",
            QualifierError::CompositeOnField { .. } => "AERO_QUALIFIER_COMPOSITE_ON_FIELD",
            QualifierError::EmptyComposite(_) => "AERO_QUALIFIER_EMPTY_COMPOSITE",
            QualifierError::NullKey => "AERO_QUALIFIER_NULL_KEY",
        }
    }
}
