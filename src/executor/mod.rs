//! Query engine
//!
//! # Execution Flow (strict order)
//!
//! 1. Compile qualifiers against one index snapshot
//! 2. Single key qualifier: fetch the record, done
//! 3. No index filter and scans disabled: reject, no request issued
//! 4. Issue the store query
//! 5. Stream records through the residual predicate
//! 6. Close the cursor on exhaustion, error, `close()` or drop

mod engine;
mod errors;
mod iter;

pub use engine::QueryEngine;
pub use errors::{QueryError, QueryResult};
pub use iter::RecordIter;
