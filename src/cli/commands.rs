//! CLI command implementations
//!
//! Commands work offline: the index list comes from a saved `sindex-list`
//! response and records from a JSON file loaded into a `MemoryStore`.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::QueryConfig;
use crate::executor::QueryEngine;
use crate::index::{parse_indexes_info, Index, IndexCache, IndexesInfo};
use crate::observability::init_tracing;
use crate::planner::{ExplainPlan, IndexFilter};
use crate::qualifier::Qualifier;
use crate::store::{Key, MemoryStore, Record};

use super::args::{Cli, Command, QueryTarget};
use super::errors::CliResult;
use super::io::{read_json, read_text, write_json, write_json_line, write_text};

/// One record in a `--records` file
#[derive(Debug, Clone, Deserialize)]
struct RecordFixture {
    namespace: String,
    #[serde(default)]
    set: Option<String>,
    key: Value,
    #[serde(default)]
    bins: Map<String, Value>,
}

impl From<RecordFixture> for Record {
    fn from(fixture: RecordFixture) -> Self {
        Record::new(
            Key::new(fixture.namespace, fixture.set.as_deref(), fixture.key),
            fixture.bins,
        )
    }
}

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let config = match &cli.config {
        Some(path) => QueryConfig::load(path)?,
        None => QueryConfig::default(),
    };
    init_tracing(&config.log_filter, config.log_json)?;
    run_command(cli.command, &config)
}

/// Run the appropriate command based on CLI args
pub fn run_command(command: Command, config: &QueryConfig) -> CliResult<()> {
    match command {
        Command::Indexes { info, namespace } => indexes(&info, namespace.as_deref()),
        Command::Explain { target, json } => {
            let plan = explain(&target, config)?;
            if json {
                write_json(&plan)
            } else {
                write_text(&plan.to_string())
            }
        }
        Command::Query { target, records } => {
            for record in query(&target, &records, config)? {
                write_json_line(&record)?;
            }
            Ok(())
        }
    }
}

/// Prints the indexes of a saved info response
pub fn indexes(info: &Path, namespace: Option<&str>) -> CliResult<()> {
    let cache = IndexCache::new();
    cache.update(load_snapshot(info)?);
    let indexes: Vec<Index> = match namespace {
        Some(namespace) => cache.indexes_for_namespace(namespace),
        None => cache.snapshot().iter().cloned().collect(),
    };
    write_json(&indexes)
}

/// Compiles the target's qualifiers against the saved index list
pub fn explain(target: &QueryTarget, config: &QueryConfig) -> CliResult<ExplainPlan> {
    let engine = engine(target, MemoryStore::new(), config)?;
    let (filter, qualifiers) = load_query(target)?;
    Ok(engine.explain(&target.namespace, target.set.as_deref(), filter, &qualifiers))
}

/// Runs the target's qualifiers against records from a JSON file
pub fn query(target: &QueryTarget, records: &Path, config: &QueryConfig) -> CliResult<Vec<Record>> {
    let store = MemoryStore::new();
    let fixtures: Vec<RecordFixture> = read_json(records)?;
    debug!(records = fixtures.len(), "loaded records");
    for fixture in fixtures {
        store.put(fixture.into());
    }

    let engine = engine(target, store, config)?;
    let (filter, qualifiers) = load_query(target)?;
    let results = engine.select(&target.namespace, target.set.as_deref(), filter, &qualifiers)?;

    let mut matched = Vec::new();
    for record in results {
        matched.push(record?);
    }
    Ok(matched)
}

fn engine(
    target: &QueryTarget,
    store: MemoryStore,
    config: &QueryConfig,
) -> CliResult<QueryEngine<MemoryStore>> {
    let cache = IndexCache::new();
    cache.update(load_snapshot(&target.info)?);
    Ok(QueryEngine::new(Arc::new(store), Arc::new(cache), config))
}

fn load_snapshot(info: &Path) -> CliResult<IndexesInfo> {
    Ok(parse_indexes_info(&read_text(info)?)?)
}

fn load_query(target: &QueryTarget) -> CliResult<(Option<IndexFilter>, Vec<Qualifier>)> {
    let filter = target.filter.as_deref().map(read_json).transpose()?;
    let qualifiers = match &target.qualifiers {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    Ok((filter, qualifiers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::{NamedTempFile, TempDir};

    const INFO: &str = "ns=test:set=people:indexname=age_idx:bin=age:type=NUMERIC:indextype=NONE";

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    fn target(dir: &TempDir, qualifiers: Value) -> QueryTarget {
        QueryTarget {
            info: write(dir, "indexes.txt", INFO),
            namespace: "test".into(),
            set: Some("people".into()),
            qualifiers: Some(write(dir, "qualifiers.json", &qualifiers.to_string())),
            filter: None,
        }
    }

    #[test]
    fn test_explain_pushes_indexed_qualifier() {
        let dir = TempDir::new().unwrap();
        let target = target(
            &dir,
            json!([{"field": {"field": "age", "operation": "GT", "value": 28}}]),
        );

        let plan = explain(&target, &QueryConfig::default()).unwrap();
        assert!(plan.accepted);
        assert_eq!(
            plan.index_filter.as_deref(),
            Some("range(age, 29, 9223372036854775807)")
        );
    }

    #[test]
    fn test_explain_rejects_unsafe_scan() {
        let dir = TempDir::new().unwrap();
        let target = target(
            &dir,
            json!([{"field": {"field": "color", "operation": "EQ", "value": "blue"}}]),
        );

        let plan = explain(&target, &QueryConfig::default()).unwrap();
        assert!(!plan.accepted);
        assert_eq!(plan.rejection_code.as_deref(), Some("AERO_QUERY_UNSAFE_FULL_SCAN"));
    }

    #[test]
    fn test_query_filters_records() {
        let dir = TempDir::new().unwrap();
        let target = target(
            &dir,
            json!([
                {"field": {"field": "age", "operation": "GTEQ", "value": 30}},
                {"field": {"field": "color", "operation": "EQ", "value": "blue"}}
            ]),
        );
        let records = write(
            &dir,
            "records.json",
            &json!([
                {"namespace": "test", "set": "people", "key": "k1", "bins": {"age": 35, "color": "blue"}},
                {"namespace": "test", "set": "people", "key": "k2", "bins": {"age": 40, "color": "red"}},
                {"namespace": "test", "set": "people", "key": "k3", "bins": {"age": 20, "color": "blue"}}
            ])
            .to_string(),
        );

        let matched = query(&target, &records, &QueryConfig::default()).unwrap();
        let keys: Vec<_> = matched.iter().map(|r| r.key.user_key.clone()).collect();
        assert_eq!(keys, vec![json!("k1")]);
    }

    #[test]
    fn test_native_filter_file() {
        let dir = TempDir::new().unwrap();
        let mut target = target(&dir, json!([]));
        target.filter = Some(write(
            &dir,
            "filter.json",
            r#"{"kind": "range", "bin": "height", "begin": 150, "end": 200}"#,
        ));

        let plan = explain(&target, &QueryConfig::default()).unwrap();
        assert_eq!(plan.index_filter.as_deref(), Some("range(height, 150, 200)"));
        assert!(plan.pushed_qualifier.is_none());
    }

    #[test]
    fn test_malformed_info_file() {
        let mut info = NamedTempFile::new().unwrap();
        info.write_all(b"ns=test:indexname=broken").unwrap();

        let err = load_snapshot(info.path()).unwrap_err();
        assert_eq!(err.code(), "AERO_INDEX_PARSE");
    }
}
