//! Query compiler
//!
//! Compiles a qualifier list into either a primary-key lookup or a store
//! statement with at most one index filter plus a client-side residual
//! predicate.
//!
//! # Design Principles
//!
//! - Correct: the records returned are exactly those matching all
//!   qualifiers, whatever is pushed down
//! - Conservative: a qualifier is pushed only when an index is known to
//!   exist and the store can express it
//! - Pure: caller-supplied qualifiers are never modified
//!
//! # Pushdown priority (strict order)
//!
//! Top-level qualifiers are walked once, in order. A leaf is tried itself;
//! a top-level AND tries its direct leaf children at its own position. The
//! first match ends the walk. OR branches are never pushed.

mod compiler;
mod errors;
mod explain;
mod filter;
mod geo;
mod predicate;

pub use compiler::{AccessPath, QueryPlan, Statement, StatementCompiler};
pub use errors::{CompilerError, CompilerResult};
pub use explain::ExplainPlan;
pub use filter::{FilterValue, IndexFilter};
pub use geo::GeoRegion;
pub use predicate::{PredicateExpr, ValueTest};
