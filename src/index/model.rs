//! Secondary-index metadata
//!
//! `IndexesInfo` is an immutable snapshot built once per refresh. Lookup
//! structures are BTree-backed so iteration and serialization are
//! deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::warn;

/// Data type an index was declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexType {
    String,
    Numeric,
    Geo2dSphere,
}

impl IndexType {
    /// Maps the info-protocol `type` value; unknown types yield `None`
    pub fn from_info(value: &str) -> Option<Self> {
        match value {
            "STRING" => Some(IndexType::String),
            "NUMERIC" => Some(IndexType::Numeric),
            "GEOJSON" => Some(IndexType::Geo2dSphere),
            _ => None,
        }
    }

    /// Name used by the info protocol
    pub fn info_name(self) -> &'static str {
        match self {
            IndexType::String => "STRING",
            IndexType::Numeric => "NUMERIC",
            IndexType::Geo2dSphere => "GEOJSON",
        }
    }
}

/// Shape of the bin an index covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexCollectionType {
    Default,
    List,
    MapKeys,
    MapValues,
}

impl IndexCollectionType {
    /// Maps the info-protocol `indextype` value; unknown shapes yield `None`
    pub fn from_info(value: &str) -> Option<Self> {
        match value {
            "NONE" => Some(IndexCollectionType::Default),
            "LIST" => Some(IndexCollectionType::List),
            "MAPKEYS" => Some(IndexCollectionType::MapKeys),
            "MAPVALUES" => Some(IndexCollectionType::MapValues),
            _ => None,
        }
    }

    pub fn info_name(self) -> &'static str {
        match self {
            IndexCollectionType::Default => "NONE",
            IndexCollectionType::List => "LIST",
            IndexCollectionType::MapKeys => "MAPKEYS",
            IndexCollectionType::MapValues => "MAPVALUES",
        }
    }
}

/// One secondary index as reported by the cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Index {
    pub name: String,
    pub namespace: String,
    /// `None` when the index spans every set of the namespace
    pub set: Option<String>,
    pub bin: String,
    /// `None` when the server reported a type this client does not know
    pub index_type: Option<IndexType>,
    /// `None` when the server reported a shape this client does not know
    pub collection_type: Option<IndexCollectionType>,
}

impl Index {
    /// Point-lookup identity of this index
    pub fn key(&self) -> IndexKey {
        IndexKey {
            namespace: self.namespace.clone(),
            set: self.set.clone(),
            field: self.bin.clone(),
            index_type: self.index_type,
        }
    }

    /// Type-agnostic identity of the indexed bin
    pub fn indexed_field(&self) -> IndexedField {
        IndexedField {
            namespace: self.namespace.clone(),
            set: self.set.clone(),
            field: self.bin.clone(),
        }
    }
}

impl fmt::Display for Index {
    /// Formats the index as one info-protocol entry
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ns={}:set={}:indexname={}:bin={}:type={}:indextype={}",
            self.namespace,
            self.set.as_deref().unwrap_or("NULL"),
            self.name,
            self.bin,
            self.index_type.map_or("UNKNOWN", IndexType::info_name),
            self.collection_type.map_or("UNKNOWN", IndexCollectionType::info_name),
        )
    }
}

/// (namespace, set, field, type) identity used for point lookups
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey {
    pub namespace: String,
    pub set: Option<String>,
    pub field: String,
    pub index_type: Option<IndexType>,
}

impl IndexKey {
    pub fn new(
        namespace: impl Into<String>,
        set: Option<&str>,
        field: impl Into<String>,
        index_type: Option<IndexType>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            set: set.map(str::to_string),
            field: field.into(),
            index_type,
        }
    }
}

/// (namespace, set, field) identity: "is this bin indexed at all"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexedField {
    pub namespace: String,
    pub set: Option<String>,
    pub field: String,
}

impl IndexedField {
    pub fn new(namespace: impl Into<String>, set: Option<&str>, field: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            set: set.map(str::to_string),
            field: field.into(),
        }
    }

    fn namespace_wide(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            set: None,
            field: self.field.clone(),
        }
    }
}

/// Immutable snapshot of every known index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexesInfo {
    indexes: BTreeMap<IndexKey, Index>,
    indexed_fields: BTreeSet<IndexedField>,
}

impl IndexesInfo {
    /// Snapshot with no indexes
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a snapshot; for duplicate keys the first index wins
    pub fn from_indexes(indexes: impl IntoIterator<Item = Index>) -> Self {
        let mut by_key: BTreeMap<IndexKey, Index> = BTreeMap::new();
        for index in indexes {
            let key = index.key();
            if let Some(existing) = by_key.get(&key) {
                warn!(
                    kept = %existing.name,
                    dropped = %index.name,
                    namespace = %index.namespace,
                    bin = %index.bin,
                    "duplicate index key, keeping first"
                );
                continue;
            }
            by_key.insert(key, index);
        }

        let indexed_fields = by_key.values().map(Index::indexed_field).collect();
        Self {
            indexes: by_key,
            indexed_fields,
        }
    }

    /// Exact lookup by key
    pub fn get(&self, key: &IndexKey) -> Option<&Index> {
        self.indexes.get(key)
    }

    /// Returns true if the bin has an index of any type.
    ///
    /// A namespace-wide index (no set) covers every set of its namespace.
    pub fn has_index_for(&self, field: &IndexedField) -> bool {
        self.indexed_fields.contains(field)
            || (field.set.is_some() && self.indexed_fields.contains(&field.namespace_wide()))
    }

    /// Returns true if an index with this name exists in the namespace
    pub fn contains_name(&self, namespace: &str, name: &str) -> bool {
        self.indexes
            .values()
            .any(|i| i.namespace == namespace && i.name == name)
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Indexes in key order
    pub fn iter(&self) -> impl Iterator<Item = &Index> {
        self.indexes.values()
    }

    /// Indexes of one namespace, in key order
    pub fn indexes_for_namespace<'a>(
        &'a self,
        namespace: &'a str,
    ) -> impl Iterator<Item = &'a Index> + 'a {
        self.indexes.values().filter(move |i| i.namespace == namespace)
    }

    pub fn indexed_fields(&self) -> impl Iterator<Item = &IndexedField> {
        self.indexed_fields.iter()
    }

    /// Serializes the snapshot in info-protocol form
    pub fn to_info_response(&self) -> String {
        self.indexes
            .values()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(";")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(name: &str, set: Option<&str>, bin: &str, index_type: IndexType) -> Index {
        Index {
            name: name.into(),
            namespace: "ns".into(),
            set: set.map(str::to_string),
            bin: bin.into(),
            index_type: Some(index_type),
            collection_type: Some(IndexCollectionType::Default),
        }
    }

    #[test]
    fn test_indexed_fields_derived_from_map() {
        let info = IndexesInfo::from_indexes([
            index("a_num", Some("s"), "a", IndexType::Numeric),
            index("a_str", Some("s"), "a", IndexType::String),
            index("b_num", Some("s"), "b", IndexType::Numeric),
        ]);

        assert_eq!(info.len(), 3);
        assert_eq!(info.indexed_fields().count(), 2);
        for field in info.indexed_fields() {
            assert!(info.iter().any(|i| &i.indexed_field() == field));
        }
    }

    #[test]
    fn test_duplicate_key_keeps_first() {
        let info = IndexesInfo::from_indexes([
            index("first", Some("s"), "a", IndexType::Numeric),
            index("second", Some("s"), "a", IndexType::Numeric),
        ]);

        assert_eq!(info.len(), 1);
        let key = IndexKey::new("ns", Some("s"), "a", Some(IndexType::Numeric));
        assert_eq!(info.get(&key).unwrap().name, "first");
    }

    #[test]
    fn test_namespace_wide_index_covers_sets() {
        let info = IndexesInfo::from_indexes([index("a", None, "a", IndexType::Numeric)]);

        assert!(info.has_index_for(&IndexedField::new("ns", Some("any"), "a")));
        assert!(info.has_index_for(&IndexedField::new("ns", None, "a")));
        assert!(!info.has_index_for(&IndexedField::new("other", Some("any"), "a")));
    }

    #[test]
    fn test_set_index_does_not_cover_other_sets() {
        let info = IndexesInfo::from_indexes([index("a", Some("s1"), "a", IndexType::Numeric)]);

        assert!(info.has_index_for(&IndexedField::new("ns", Some("s1"), "a")));
        assert!(!info.has_index_for(&IndexedField::new("ns", Some("s2"), "a")));
        assert!(!info.has_index_for(&IndexedField::new("ns", None, "a")));
    }

    #[test]
    fn test_display_is_info_entry() {
        let idx = index("idx1", Some("s"), "age", IndexType::Numeric);
        assert_eq!(
            idx.to_string(),
            "ns=ns:set=s:indexname=idx1:bin=age:type=NUMERIC:indextype=NONE"
        );

        let no_set = index("idx2", None, "loc", IndexType::Geo2dSphere);
        assert_eq!(
            no_set.to_string(),
            "ns=ns:set=NULL:indexname=idx2:bin=loc:type=GEOJSON:indextype=NONE"
        );
    }
}
