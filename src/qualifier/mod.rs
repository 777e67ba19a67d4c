//! Qualifier model
//!
//! Filter conditions supplied by the mapping layer: leaf comparisons on a
//! bin, AND / OR composites, and the primary-key qualifier.

mod ast;
mod errors;
mod operation;

pub use ast::{FieldQualifier, Qualifier};
pub use errors::{QualifierError, QualifierResult};
pub use operation::{
    CollectionShape, Comparison, FilterOperation, Junction, MembershipTest, OperationCategory,
    StringMatch,
};
