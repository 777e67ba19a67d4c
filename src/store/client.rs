//! Capabilities the query core consumes but does not implement

use crate::index::IndexSpec;

use super::errors::StoreResult;
use super::record::{Key, Record, ScanRequest};

/// Lazy, closable sequence of records returned by a store query.
///
/// `close` releases the server-side cursor and must be idempotent.
pub trait RecordCursor: Iterator<Item = StoreResult<Record>> {
    fn close(&mut self);
}

/// Record fetch and query capability of the key/value store
pub trait RecordStore {
    type Cursor: RecordCursor;

    /// Point fetch by fully-qualified key; `None` if the record does not exist
    fn get(&self, key: &Key) -> StoreResult<Option<Record>>;

    /// Issues a query with at most one secondary-index filter
    fn query(&self, request: &ScanRequest) -> StoreResult<Self::Cursor>;
}

/// Info-protocol access to individual cluster nodes
pub trait ClusterInfo: Send + Sync {
    /// Names of nodes currently believed active
    fn active_nodes(&self) -> Vec<String>;

    /// Sends one info command to one node and returns the raw response text
    fn request_info(&self, node: &str, command: &str) -> StoreResult<String>;
}

/// Secondary-index DDL capability
pub trait IndexAdmin: Send + Sync {
    fn create_index(&self, spec: &IndexSpec) -> StoreResult<()>;

    fn drop_index(&self, namespace: &str, set: Option<&str>, name: &str) -> StoreResult<()>;
}
