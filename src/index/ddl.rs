//! Index DDL with cache refresh
//!
//! Every successful create or drop is followed by an immediate refresh so
//! the planner sees the change without waiting for the next poll.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::store::{ClusterInfo, IndexAdmin};

use super::errors::IndexResult;
use super::model::{Index, IndexCollectionType, IndexType};
use super::refresher::{IndexRefresher, RefreshOutcome};

/// Definition of an index to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    pub namespace: String,
    pub set: Option<String>,
    pub name: String,
    pub bin: String,
    pub index_type: IndexType,
    pub collection_type: IndexCollectionType,
}

impl IndexSpec {
    pub fn new(
        namespace: impl Into<String>,
        set: Option<&str>,
        name: impl Into<String>,
        bin: impl Into<String>,
        index_type: IndexType,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            set: set.map(str::to_string),
            name: name.into(),
            bin: bin.into(),
            index_type,
            collection_type: IndexCollectionType::Default,
        }
    }

    /// Numeric index over a scalar bin
    pub fn numeric(
        namespace: impl Into<String>,
        set: Option<&str>,
        name: impl Into<String>,
        bin: impl Into<String>,
    ) -> Self {
        Self::new(namespace, set, name, bin, IndexType::Numeric)
    }

    /// Overrides the collection shape (list elements, map keys, map values)
    pub fn with_collection_type(mut self, collection_type: IndexCollectionType) -> Self {
        self.collection_type = collection_type;
        self
    }

    /// The index as the cluster will report it
    pub fn to_index(&self) -> Index {
        Index {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            set: self.set.clone(),
            bin: self.bin.clone(),
            index_type: Some(self.index_type),
            collection_type: Some(self.collection_type),
        }
    }
}

/// Index create/drop that keeps the cache current
pub struct IndexOperations<A: IndexAdmin, C: ClusterInfo> {
    admin: Arc<A>,
    refresher: Arc<IndexRefresher<C>>,
}

impl<A: IndexAdmin, C: ClusterInfo> IndexOperations<A, C> {
    pub fn new(admin: Arc<A>, refresher: Arc<IndexRefresher<C>>) -> Self {
        Self { admin, refresher }
    }

    /// Creates an index, then refreshes the cache.
    ///
    /// A DDL failure is returned without refreshing.
    pub fn create_index(&self, spec: &IndexSpec) -> IndexResult<RefreshOutcome> {
        self.admin.create_index(spec)?;
        info!(
            namespace = %spec.namespace,
            name = %spec.name,
            bin = %spec.bin,
            "created index"
        );
        self.refresher.refresh_indexes()
    }

    /// Drops an index, then refreshes the cache
    pub fn drop_index(
        &self,
        namespace: &str,
        set: Option<&str>,
        name: &str,
    ) -> IndexResult<RefreshOutcome> {
        self.admin.drop_index(namespace, set, name)?;
        info!(namespace, name, "dropped index");
        self.refresher.refresh_indexes()
    }

    /// Returns true if the current snapshot has an index with this name
    pub fn index_exists(&self, namespace: &str, name: &str) -> bool {
        self.refresher.cache().snapshot().contains_name(namespace, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexCache, IndexedField};
    use crate::store::MemoryCluster;

    fn operations() -> (Arc<IndexCache>, IndexOperations<MemoryCluster, MemoryCluster>) {
        let cluster = Arc::new(MemoryCluster::with_nodes(["n1"]));
        let cache = Arc::new(IndexCache::new());
        let refresher = Arc::new(IndexRefresher::new(Arc::clone(&cluster), Arc::clone(&cache)));
        (cache, IndexOperations::new(cluster, refresher))
    }

    #[test]
    fn test_create_refreshes_cache() {
        let (cache, ops) = operations();
        let field = IndexedField::new("ns", Some("s"), "age");
        assert!(!cache.has_index_for(&field));

        ops.create_index(&IndexSpec::numeric("ns", Some("s"), "age_idx", "age"))
            .unwrap();

        assert!(cache.has_index_for(&field));
        assert!(ops.index_exists("ns", "age_idx"));
    }

    #[test]
    fn test_drop_refreshes_cache() {
        let (cache, ops) = operations();
        ops.create_index(&IndexSpec::numeric("ns", Some("s"), "age_idx", "age"))
            .unwrap();

        ops.drop_index("ns", Some("s"), "age_idx").unwrap();

        assert!(!cache.has_index_for(&IndexedField::new("ns", Some("s"), "age")));
        assert!(!ops.index_exists("ns", "age_idx"));
    }

    #[test]
    fn test_failed_ddl_is_reported() {
        let (_cache, ops) = operations();
        let err = ops.drop_index("ns", Some("s"), "missing").unwrap_err();
        assert_eq!(err.code(), "AERO_INDEX_DDL_FAILED");
    }

    #[test]
    fn test_collection_index_spec() {
        let spec = IndexSpec::new("ns", None, "tags_idx", "tags", IndexType::String)
            .with_collection_type(IndexCollectionType::List);
        let index = spec.to_index();
        assert_eq!(index.collection_type, Some(IndexCollectionType::List));
        assert_eq!(index.set, None);
    }
}
