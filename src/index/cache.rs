//! Lock-free holder of the current index snapshot
//!
//! Readers load an `Arc<IndexesInfo>` and never block; the refresher swaps
//! in a complete replacement. A reader sees either the old or the new
//! snapshot, never a mix.

use std::sync::Arc;

use arc_swap::ArcSwap;

use super::model::{Index, IndexKey, IndexedField, IndexesInfo};

/// Shared view of which secondary indexes exist
#[derive(Debug)]
pub struct IndexCache {
    current: ArcSwap<IndexesInfo>,
}

impl IndexCache {
    /// Creates a cache with an empty snapshot (nothing indexed)
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(IndexesInfo::empty()),
        }
    }

    /// Returns true if the latest snapshot has an index of any type on the field
    pub fn has_index_for(&self, field: &IndexedField) -> bool {
        self.current.load().has_index_for(field)
    }

    /// Looks up an index by exact key in the latest snapshot
    pub fn get_index(&self, key: &IndexKey) -> Option<Index> {
        self.current.load().get(key).cloned()
    }

    /// Indexes of one namespace in the latest snapshot
    pub fn indexes_for_namespace(&self, namespace: &str) -> Vec<Index> {
        self.current
            .load()
            .indexes_for_namespace(namespace)
            .cloned()
            .collect()
    }

    /// Publishes a new snapshot
    pub fn update(&self, info: IndexesInfo) {
        self.current.store(Arc::new(info));
    }

    /// Returns the latest snapshot for consistent multi-step reads
    pub fn snapshot(&self) -> Arc<IndexesInfo> {
        self.current.load_full()
    }
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexCollectionType, IndexType};
    use std::thread;

    fn numeric(name: &str, bin: &str) -> Index {
        Index {
            name: name.into(),
            namespace: "ns".into(),
            set: Some("s".into()),
            bin: bin.into(),
            index_type: Some(IndexType::Numeric),
            collection_type: Some(IndexCollectionType::Default),
        }
    }

    #[test]
    fn test_starts_empty() {
        let cache = IndexCache::new();
        assert!(!cache.has_index_for(&IndexedField::new("ns", Some("s"), "age")));
        assert!(cache.snapshot().is_empty());
    }

    #[test]
    fn test_update_replaces_snapshot() {
        let cache = IndexCache::new();
        cache.update(IndexesInfo::from_indexes([numeric("age_idx", "age")]));

        let key = IndexKey::new("ns", Some("s"), "age", Some(IndexType::Numeric));
        assert_eq!(cache.get_index(&key).unwrap().name, "age_idx");

        cache.update(IndexesInfo::from_indexes([numeric("height_idx", "height")]));
        assert!(cache.get_index(&key).is_none());
        assert!(cache.has_index_for(&IndexedField::new("ns", Some("s"), "height")));
    }

    #[test]
    fn test_indexes_for_namespace() {
        let cache = IndexCache::new();
        let mut other = numeric("other_idx", "age");
        other.namespace = "other".into();
        cache.update(IndexesInfo::from_indexes([numeric("age_idx", "age"), other]));

        let names: Vec<_> = cache
            .indexes_for_namespace("ns")
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["age_idx".to_string()]);
        assert!(cache.indexes_for_namespace("missing").is_empty());
    }

    #[test]
    fn test_held_snapshot_is_unaffected_by_update() {
        let cache = IndexCache::new();
        cache.update(IndexesInfo::from_indexes([numeric("age_idx", "age")]));

        let held = cache.snapshot();
        cache.update(IndexesInfo::empty());

        assert_eq!(held.len(), 1);
        assert!(cache.snapshot().is_empty());
    }

    #[test]
    fn test_concurrent_readers_see_complete_snapshots() {
        // Each published snapshot indexes both "a{n}" and "b{n}"; a reader
        // that sees one without the other observed a torn snapshot.
        let cache = Arc::new(IndexCache::new());

        let writer = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for n in 0..500 {
                    cache.update(IndexesInfo::from_indexes([
                        numeric(&format!("a{}", n), &format!("a{}", n)),
                        numeric(&format!("b{}", n), &format!("b{}", n)),
                    ]));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for _ in 0..2000 {
                        let snapshot = cache.snapshot();
                        assert!(snapshot.len() == 0 || snapshot.len() == 2);
                        for index in snapshot.iter() {
                            let suffix = &index.bin[1..];
                            let a = IndexedField::new("ns", Some("s"), format!("a{}", suffix));
                            let b = IndexedField::new("ns", Some("s"), format!("b{}", suffix));
                            assert!(snapshot.has_index_for(&a));
                            assert!(snapshot.has_index_for(&b));
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
