//! In-memory store and cluster
//!
//! Used for local development and tests. The store evaluates index filters
//! the way the server would; the cluster serves `sindex-list` responses from
//! its own index list and accepts index DDL.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::index::{Index, IndexSpec, IndexesInfo};

use super::client::{ClusterInfo, IndexAdmin, RecordCursor, RecordStore};
use super::errors::{StoreError, StoreResult};
use super::record::{Key, Record, ScanRequest};

/// Server result code for a duplicate index
const INDEX_ALREADY_EXISTS: i32 = 200;
/// Server result code for dropping an unknown index
const INDEX_NOT_FOUND: i32 = 201;

/// Record store backed by a vector
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Record>>,
    open_cursors: Arc<AtomicUsize>,
    queries_issued: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record by key
    pub fn put(&self, record: Record) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        match records.iter_mut().find(|r| r.key == record.key) {
            Some(existing) => {
                let generation = existing.generation + 1;
                *existing = record;
                existing.generation = generation;
            }
            None => records.push(record),
        }
    }

    /// Number of cursors handed out and not yet closed
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Number of `query` calls received
    pub fn queries_issued(&self) -> usize {
        self.queries_issued.load(Ordering::SeqCst)
    }
}

impl RecordStore for MemoryStore {
    type Cursor = MemoryCursor;

    fn get(&self, key: &Key) -> StoreResult<Option<Record>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.iter().find(|r| &r.key == key).cloned())
    }

    fn query(&self, request: &ScanRequest) -> StoreResult<MemoryCursor> {
        self.queries_issued.fetch_add(1, Ordering::SeqCst);
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let matching: Vec<Record> = records
            .iter()
            .filter(|r| r.key.namespace == request.namespace)
            .filter(|r| request.set.is_none() || r.key.set == request.set)
            .filter(|r| {
                request
                    .filter
                    .as_ref()
                    .map_or(true, |filter| filter.matches(&r.bins))
            })
            .cloned()
            .collect();

        self.open_cursors.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryCursor {
            records: matching.into_iter(),
            open_cursors: Arc::clone(&self.open_cursors),
            closed: false,
        })
    }
}

/// Cursor over a materialized result set.
///
/// Does not close itself on drop; unclosed cursors show up in
/// `MemoryStore::open_cursors`.
#[derive(Debug)]
pub struct MemoryCursor {
    records: std::vec::IntoIter<Record>,
    open_cursors: Arc<AtomicUsize>,
    closed: bool,
}

impl Iterator for MemoryCursor {
    type Item = StoreResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return Some(Err(StoreError::CursorClosed));
        }
        self.records.next().map(Ok)
    }
}

impl RecordCursor for MemoryCursor {
    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.open_cursors.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Cluster whose nodes all report the same index list
#[derive(Debug, Default)]
pub struct MemoryCluster {
    nodes: RwLock<Vec<String>>,
    unreachable: RwLock<HashSet<String>>,
    indexes: RwLock<Vec<Index>>,
    info_requests: AtomicUsize,
}

impl MemoryCluster {
    /// Creates a cluster with the given node names
    pub fn with_nodes<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: RwLock::new(nodes.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Registers an index directly, bypassing DDL
    pub fn add_index(&self, index: Index) {
        self.indexes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(index);
    }

    /// Marks a node as not answering info requests
    pub fn set_unreachable(&self, node: &str, unreachable: bool) {
        let mut down = self.unreachable.write().unwrap_or_else(PoisonError::into_inner);
        if unreachable {
            down.insert(node.to_string());
        } else {
            down.remove(node);
        }
    }

    /// Number of info requests answered or refused
    pub fn info_requests(&self) -> usize {
        self.info_requests.load(Ordering::SeqCst)
    }
}

impl ClusterInfo for MemoryCluster {
    fn active_nodes(&self) -> Vec<String> {
        self.nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn request_info(&self, node: &str, _command: &str) -> StoreResult<String> {
        self.info_requests.fetch_add(1, Ordering::SeqCst);
        let down = self.unreachable.read().unwrap_or_else(PoisonError::into_inner);
        if down.contains(node) {
            return Err(StoreError::Unreachable {
                node: node.to_string(),
                reason: "connection refused".into(),
            });
        }
        let indexes = self.indexes.read().unwrap_or_else(PoisonError::into_inner);
        Ok(IndexesInfo::from_indexes(indexes.iter().cloned()).to_info_response())
    }
}

impl IndexAdmin for MemoryCluster {
    fn create_index(&self, spec: &IndexSpec) -> StoreResult<()> {
        let mut indexes = self.indexes.write().unwrap_or_else(PoisonError::into_inner);
        if indexes
            .iter()
            .any(|i| i.namespace == spec.namespace && i.name == spec.name)
        {
            return Err(StoreError::Server {
                code: INDEX_ALREADY_EXISTS,
                message: format!("index '{}' already exists", spec.name),
            });
        }
        indexes.push(spec.to_index());
        Ok(())
    }

    fn drop_index(&self, namespace: &str, set: Option<&str>, name: &str) -> StoreResult<()> {
        let mut indexes = self.indexes.write().unwrap_or_else(PoisonError::into_inner);
        let before = indexes.len();
        indexes.retain(|i| {
            !(i.namespace == namespace && i.set.as_deref() == set && i.name == name)
        });
        if indexes.len() == before {
            return Err(StoreError::Server {
                code: INDEX_NOT_FOUND,
                message: format!("index '{}' not found", name),
            });
        }
        Ok(())
    }
}
