//! Parser for the `sindex-list` info response
//!
//! Format: indexes separated by `;`, fields by `:`, each field `key=value`.
//!
//! ```text
//! ns=test:set=person:indexname=age_idx:bin=age:type=NUMERIC:indextype=NONE;ns=...
//! ```
//!
//! Unknown keys are ignored, and unknown `type` or `indextype` values are
//! kept as `None`. A missing required key fails the whole parse so that a
//! partial snapshot is never published.

use std::collections::HashMap;

use super::errors::{IndexError, IndexResult};
use super::model::{Index, IndexCollectionType, IndexType, IndexesInfo};

const ENTRY_SEPARATOR: char = ';';
const FIELD_SEPARATOR: char = ':';

/// Parses a full info response into a snapshot.
///
/// Empty or whitespace-only input yields an empty snapshot.
pub fn parse_indexes_info(response: &str) -> IndexResult<IndexesInfo> {
    let indexes = response
        .split(ENTRY_SEPARATOR)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_index)
        .collect::<IndexResult<Vec<_>>>()?;

    Ok(IndexesInfo::from_indexes(indexes))
}

/// Parses a single index entry
pub fn parse_index(entry: &str) -> IndexResult<Index> {
    let fields = parse_fields(entry)?;

    let name = required(&fields, entry, &["indexname", "name"])?;
    let namespace = required(&fields, entry, &["ns", "namespace"])?;
    let bin = required(&fields, entry, &["bin", "bins"])?;
    let type_value = required(&fields, entry, &["type"])?;
    let collection_value = required(&fields, entry, &["indextype"])?;

    let set = fields
        .get("set")
        .copied()
        .filter(|set| !set.is_empty() && !set.eq_ignore_ascii_case("null"))
        .map(str::to_string);

    Ok(Index {
        name: name.to_string(),
        namespace: namespace.to_string(),
        set,
        bin: bin.to_string(),
        index_type: IndexType::from_info(type_value),
        collection_type: IndexCollectionType::from_info(collection_value),
    })
}

fn parse_fields(entry: &str) -> IndexResult<HashMap<&str, &str>> {
    entry
        .split(FIELD_SEPARATOR)
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(|field| {
            field
                .split_once('=')
                .map(|(key, value)| (key.trim(), value.trim()))
                .ok_or_else(|| IndexError::MalformedField {
                    entry: entry.to_string(),
                    field: field.to_string(),
                })
        })
        .collect()
}

/// Returns the first present alias; empty values count as missing
fn required<'a>(
    fields: &HashMap<&str, &'a str>,
    entry: &str,
    aliases: &[&'static str],
) -> IndexResult<&'a str> {
    aliases
        .iter()
        .find_map(|alias| fields.get(alias).copied().filter(|v| !v.is_empty()))
        .ok_or_else(|| IndexError::MissingKey {
            entry: entry.to_string(),
            key: aliases[0],
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexKey, IndexedField};

    #[test]
    fn test_single_entry() {
        let info =
            parse_indexes_info("ns=n:set=s:indexname=idx1:bin=age:type=NUMERIC:indextype=NONE")
                .unwrap();

        assert_eq!(info.len(), 1);
        let index = info.iter().next().unwrap();
        assert_eq!(
            index,
            &Index {
                name: "idx1".into(),
                namespace: "n".into(),
                set: Some("s".into()),
                bin: "age".into(),
                index_type: Some(IndexType::Numeric),
                collection_type: Some(IndexCollectionType::Default),
            }
        );
        assert!(info.has_index_for(&IndexedField::new("n", Some("s"), "age")));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_indexes_info("").unwrap().is_empty());
        assert!(parse_indexes_info("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_aliases_and_extra_keys() {
        let info = parse_indexes_info(
            "namespace=n:set=s:indexname=i:num_bins=1:bins=tags:type=STRING:indextype=LIST:state=RW:path=tags;",
        )
        .unwrap();

        let index = info.iter().next().unwrap();
        assert_eq!(index.namespace, "n");
        assert_eq!(index.bin, "tags");
        assert_eq!(index.index_type, Some(IndexType::String));
        assert_eq!(index.collection_type, Some(IndexCollectionType::List));
    }

    #[test]
    fn test_null_set_normalized() {
        for literal in ["null", "NULL", "Null"] {
            let response = format!(
                "ns=n:set={}:indexname=geo:bin=loc:type=GEOJSON:indextype=NONE",
                literal
            );
            let info = parse_indexes_info(&response).unwrap();
            let index = info.iter().next().unwrap();
            assert_eq!(index.set, None);
            assert_eq!(index.index_type, Some(IndexType::Geo2dSphere));
        }
    }

    #[test]
    fn test_missing_set_is_namespace_wide() {
        let info = parse_indexes_info("ns=n:indexname=i:bin=a:type=NUMERIC:indextype=NONE").unwrap();
        let key = IndexKey::new("n", None, "a", Some(IndexType::Numeric));
        assert!(info.get(&key).is_some());
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        let info = parse_indexes_info("ns=n:set=s:indexname=i:bin=a:type=BLOB:indextype=NONE").unwrap();
        assert_eq!(info.iter().next().unwrap().index_type, None);
    }

    #[test]
    fn test_unknown_collection_type_keeps_other_entries() {
        let response = "ns=n:set=s:indexname=ok:bin=a:type=NUMERIC:indextype=NONE;\
                        ns=n:set=s:indexname=future:bin=b:type=STRING:indextype=FUTURE";
        let info = parse_indexes_info(response).unwrap();

        assert_eq!(info.len(), 2);
        let future = IndexKey::new("n", Some("s"), "b", Some(IndexType::String));
        assert_eq!(info.get(&future).unwrap().collection_type, None);
        assert!(info.has_index_for(&IndexedField::new("n", Some("s"), "a")));
    }

    #[test]
    fn test_missing_required_key_fails_whole_response() {
        let response = "ns=n:set=s:indexname=ok:bin=a:type=STRING:indextype=NONE;\
                        ns=n:set=s:indexname=broken:type=STRING:indextype=NONE";
        let err = parse_indexes_info(response).unwrap_err();
        match err {
            IndexError::MissingKey { key, .. } => assert_eq!(key, "bin"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_field_without_equals_fails() {
        let err = parse_index("ns=n:garbage:indexname=i:bin=a:type=STRING:indextype=NONE")
            .unwrap_err();
        assert!(matches!(err, IndexError::MalformedField { .. }));
    }

    #[test]
    fn test_round_trip() {
        let response = "ns=n:set=s:indexname=a:bin=age:type=NUMERIC:indextype=NONE;\
                        ns=n:set=null:indexname=b:bin=loc:type=GEOJSON:indextype=NONE;\
                        ns=n:set=s:indexname=c:bin=tags:type=STRING:indextype=MAPKEYS;\
                        ns=n:set=s:indexname=d:bin=odd:type=WHATEVER:indextype=MAPVALUES";
        let first = parse_indexes_info(response).unwrap();
        let second = parse_indexes_info(&first.to_info_response()).unwrap();

        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
    }
}
