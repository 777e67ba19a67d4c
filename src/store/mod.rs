//! Record store collaborators
//!
//! The query core consumes three capabilities from the surrounding system:
//! point fetch and filtered query (`RecordStore`), info requests to cluster
//! nodes (`ClusterInfo`) and index DDL (`IndexAdmin`). In-memory
//! implementations back local development and tests.

mod client;
mod errors;
mod memory;
mod record;

pub use client::{ClusterInfo, IndexAdmin, RecordCursor, RecordStore};
pub use errors::{StoreError, StoreResult};
pub use memory::{MemoryCluster, MemoryCursor, MemoryStore};
pub use record::{Key, Record, ScanRequest};
