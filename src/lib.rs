//! aeroquery - index-aware query compiler for a distributed key/value store
//!
//! Keeps a cache of the cluster's secondary indexes and compiles qualifier
//! trees into one server-side index filter plus a client-side residual
//! predicate.

pub mod cli;
pub mod config;
pub mod executor;
pub mod index;
pub mod observability;
pub mod planner;
pub mod qualifier;
pub mod store;
