//! Secondary-index metadata subsystem
//!
//! Which indexes exist is only known by asking the cluster. This module
//! holds that knowledge as an immutable snapshot and keeps it fresh.
//!
//! # Design Principles
//!
//! - Snapshot: `IndexesInfo` is built once per refresh and never mutated
//! - Lock-free: `IndexCache` swaps whole snapshots; readers never block
//! - Conservative: before the first refresh nothing is considered indexed
//!
//! # Refresh triggers
//!
//! - Startup
//! - After every successful index create/drop (`IndexOperations`)
//! - Periodic poll (`IndexRefresher::spawn_periodic`)

mod cache;
mod ddl;
mod errors;
mod info_parser;
mod model;
mod refresher;

pub use cache::IndexCache;
pub use ddl::{IndexOperations, IndexSpec};
pub use errors::{IndexError, IndexResult};
pub use info_parser::{parse_index, parse_indexes_info};
pub use model::{Index, IndexCollectionType, IndexKey, IndexType, IndexedField, IndexesInfo};
pub use refresher::{IndexRefresher, RefreshOutcome, DEFAULT_INFO_COMMAND};
