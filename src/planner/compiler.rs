//! Statement compiler
//!
//! Turns a namespace, optional set, optional caller-supplied index filter
//! and a list of qualifiers into a `QueryPlan`.
//!
//! # Index pushdown
//!
//! When the caller supplies no filter, at most one qualifier is pushed to
//! the store as an `IndexFilter`. Top-level qualifiers are walked once, in
//! order. A leaf is a candidate itself; a top-level AND contributes its
//! direct leaf children at its own position.
//!
//! The first candidate whose operation is pushable, whose operand the index
//! query can express, and whose field has an index in the current snapshot
//! wins and ends the walk. OR branches are never pushed. Everything else
//! becomes the residual predicate evaluated client-side.

use serde_json::{Map, Value};
use tracing::debug;

use crate::index::{IndexCache, IndexedField, IndexesInfo};
use crate::qualifier::{FieldQualifier, Qualifier};
use crate::store::{Key, ScanRequest};

use super::errors::{CompilerError, CompilerResult};
use super::filter::IndexFilter;
use super::predicate::PredicateExpr;

/// How a plan reaches its records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPath {
    PointLookup,
    IndexQuery,
    FullScan,
}

impl AccessPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessPath::PointLookup => "POINT_LOOKUP",
            AccessPath::IndexQuery => "INDEX_QUERY",
            AccessPath::FullScan => "FULL_SCAN",
        }
    }
}

/// Compiled scan or index query
#[derive(Debug, Clone)]
pub struct Statement {
    pub namespace: String,
    pub set: Option<String>,
    /// Filter the store evaluates
    pub filter: Option<IndexFilter>,
    /// Qualifier the filter was derived from, if it was pushed down
    pub pushed: Option<Qualifier>,
    /// Qualifiers left for client-side evaluation
    pub residual: Vec<Qualifier>,
    /// Compiled form of `residual`
    pub predicate: Option<PredicateExpr>,
}

impl Statement {
    /// Statement reading every record of a namespace or set
    pub fn full_scan(namespace: impl Into<String>, set: Option<&str>) -> Self {
        Self {
            namespace: namespace.into(),
            set: set.map(str::to_string),
            filter: None,
            pushed: None,
            residual: Vec::new(),
            predicate: None,
        }
    }

    pub fn is_full_scan(&self) -> bool {
        self.filter.is_none()
    }

    /// Request sent to the store
    pub fn scan_request(&self) -> ScanRequest {
        ScanRequest {
            namespace: self.namespace.clone(),
            set: self.set.clone(),
            filter: self.filter.clone(),
        }
    }

    /// Returns true if a returned record passes the residual predicate
    pub fn accepts(&self, bins: &Map<String, Value>) -> bool {
        self.predicate.as_ref().map_or(true, |p| p.matches(bins))
    }
}

/// Output of compilation
#[derive(Debug, Clone)]
pub enum QueryPlan {
    PointLookup(Key),
    Scan(Statement),
}

impl QueryPlan {
    pub fn access_path(&self) -> AccessPath {
        match self {
            QueryPlan::PointLookup(_) => AccessPath::PointLookup,
            QueryPlan::Scan(statement) if statement.is_full_scan() => AccessPath::FullScan,
            QueryPlan::Scan(_) => AccessPath::IndexQuery,
        }
    }

    pub fn statement(&self) -> Option<&Statement> {
        match self {
            QueryPlan::Scan(statement) => Some(statement),
            QueryPlan::PointLookup(_) => None,
        }
    }
}

/// Compiles qualifier lists against the latest index snapshot
pub struct StatementCompiler<'a> {
    cache: &'a IndexCache,
}

impl<'a> StatementCompiler<'a> {
    pub fn new(cache: &'a IndexCache) -> Self {
        Self { cache }
    }

    /// Compiles a query.
    ///
    /// A lone key qualifier is a point lookup, whatever `native_filter` is.
    /// Otherwise a caller-supplied `native_filter` disables pushdown; every
    /// qualifier is then residual. One snapshot is read per call, so all eligibility
    /// decisions see the same set of indexes.
    pub fn compile(
        &self,
        namespace: &str,
        set: Option<&str>,
        native_filter: Option<IndexFilter>,
        qualifiers: &[Qualifier],
    ) -> CompilerResult<QueryPlan> {
        for qualifier in qualifiers {
            qualifier.validate()?;
        }

        if let [Qualifier::Key(user_key)] = qualifiers {
            if let Some(filter) = &native_filter {
                debug!(namespace, filter = %filter, "key lookup ignores supplied index filter");
            }
            return Ok(QueryPlan::PointLookup(Key::new(namespace, set, user_key.clone())));
        }
        if qualifiers.iter().any(Qualifier::contains_key) {
            return Err(CompilerError::KeyQualifierNotAlone);
        }

        if qualifiers.is_empty() && native_filter.is_none() {
            return Err(CompilerError::EmptyStatement {
                namespace: namespace.to_string(),
                set: set.map(str::to_string),
            });
        }

        let mut statement = Statement::full_scan(namespace, set);
        match native_filter {
            Some(filter) => {
                statement.filter = Some(filter);
                statement.residual = qualifiers.to_vec();
            }
            None => {
                let snapshot = self.cache.snapshot();
                let pushdown = Pushdown::find(&snapshot, namespace, set, qualifiers);
                statement.residual = match &pushdown {
                    Some(found) => found.residual(qualifiers),
                    None => qualifiers.to_vec(),
                };
                if let Some(found) = pushdown {
                    debug!(
                        namespace,
                        field = found.leaf.field(),
                        filter = %found.filter,
                        "pushed qualifier into index filter"
                    );
                    statement.pushed = Some(Qualifier::Field(found.leaf.clone()));
                    statement.filter = Some(found.filter);
                }
            }
        }

        statement.predicate = PredicateExpr::conjunction(&statement.residual)?;
        Ok(QueryPlan::Scan(statement))
    }
}

/// Location of the pushed leaf within the qualifier list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    TopLevel(usize),
    AndChild(usize, usize),
}

struct Pushdown<'q> {
    position: Position,
    leaf: &'q FieldQualifier,
    filter: IndexFilter,
}

impl<'q> Pushdown<'q> {
    fn find(
        snapshot: &IndexesInfo,
        namespace: &str,
        set: Option<&str>,
        qualifiers: &'q [Qualifier],
    ) -> Option<Self> {
        let eligible = |leaf: &FieldQualifier| {
            let filter = IndexFilter::from_qualifier(leaf)?;
            snapshot
                .has_index_for(&IndexedField::new(namespace, set, leaf.field()))
                .then_some(filter)
        };

        qualifiers.iter().enumerate().find_map(|(i, q)| match q {
            Qualifier::Field(leaf) => eligible(leaf).map(|filter| Pushdown {
                position: Position::TopLevel(i),
                leaf,
                filter,
            }),
            Qualifier::And(children) => children.iter().enumerate().find_map(|(j, child)| {
                match child {
                    Qualifier::Field(leaf) => eligible(leaf).map(|filter| Pushdown {
                        position: Position::AndChild(i, j),
                        leaf,
                        filter,
                    }),
                    _ => None,
                }
            }),
            _ => None,
        })
    }

    /// Qualifiers with the pushed leaf removed. The input is not modified.
    fn residual(&self, qualifiers: &[Qualifier]) -> Vec<Qualifier> {
        let mut residual = Vec::with_capacity(qualifiers.len());
        for (i, qualifier) in qualifiers.iter().enumerate() {
            match self.position {
                Position::TopLevel(pushed) if pushed == i => {}
                Position::AndChild(parent, pushed) if parent == i => {
                    let mut rest: Vec<Qualifier> = qualifier
                        .children()
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != pushed)
                        .map(|(_, child)| child.clone())
                        .collect();
                    match rest.len() {
                        0 => {}
                        1 => residual.extend(rest.pop()),
                        _ => residual.push(Qualifier::And(rest)),
                    }
                }
                _ => residual.push(qualifier.clone()),
            }
        }
        residual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Index, IndexCollectionType, IndexType};
    use crate::planner::FilterValue;
    use serde_json::json;

    fn index(set: Option<&str>, bin: &str, index_type: IndexType) -> Index {
        Index {
            name: format!("{}_idx", bin),
            namespace: "test".into(),
            set: set.map(str::to_string),
            bin: bin.into(),
            index_type: Some(index_type),
            collection_type: Some(IndexCollectionType::Default),
        }
    }

    fn cache_with(indexes: Vec<Index>) -> IndexCache {
        let cache = IndexCache::new();
        cache.update(IndexesInfo::from_indexes(indexes));
        cache
    }

    fn scan(plan: QueryPlan) -> Statement {
        match plan {
            QueryPlan::Scan(statement) => statement,
            other => panic!("expected scan, got {:?}", other),
        }
    }

    #[test]
    fn test_key_qualifier_compiles_to_point_lookup() {
        let cache = IndexCache::new();
        let plan = StatementCompiler::new(&cache)
            .compile("test", Some("people"), None, &[Qualifier::key("k1")])
            .unwrap();

        assert_eq!(plan.access_path(), AccessPath::PointLookup);
        match plan {
            QueryPlan::PointLookup(key) => {
                assert_eq!(key, Key::new("test", Some("people"), "k1"));
            }
            other => panic!("expected point lookup, got {:?}", other),
        }
    }

    #[test]
    fn test_key_qualifier_must_be_alone() {
        let cache = IndexCache::new();
        let compiler = StatementCompiler::new(&cache);

        let err = compiler
            .compile("test", None, None, &[Qualifier::key("k1"), Qualifier::eq("a", 1)])
            .unwrap_err();
        assert_eq!(err, CompilerError::KeyQualifierNotAlone);

        let nested = Qualifier::or(vec![Qualifier::key("k1"), Qualifier::eq("a", 1)]);
        let err = compiler.compile("test", None, None, &[nested]).unwrap_err();
        assert_eq!(err, CompilerError::KeyQualifierNotAlone);

        let nested = Qualifier::and(vec![Qualifier::eq("a", 1), Qualifier::key("k1")]);
        let err = compiler
            .compile("test", None, Some(IndexFilter::range("age", 0, 10)), &[nested])
            .unwrap_err();
        assert_eq!(err, CompilerError::KeyQualifierNotAlone);
    }

    #[test]
    fn test_lone_key_ignores_native_filter() {
        let cache = IndexCache::new();
        let plan = StatementCompiler::new(&cache)
            .compile(
                "test",
                Some("people"),
                Some(IndexFilter::range("age", 0, 10)),
                &[Qualifier::key("k1")],
            )
            .unwrap();

        assert_eq!(plan.access_path(), AccessPath::PointLookup);
        match plan {
            QueryPlan::PointLookup(key) => {
                assert_eq!(key, Key::new("test", Some("people"), "k1"))
            }
            other => panic!("expected point lookup, got {:?}", other),
        }
    }

    #[test]
    fn test_pushdown_of_indexed_range() {
        let cache = cache_with(vec![index(Some("people"), "age", IndexType::Numeric)]);
        let statement = scan(
            StatementCompiler::new(&cache)
                .compile("test", Some("people"), None, &[Qualifier::gt("age", 28)])
                .unwrap(),
        );

        assert_eq!(statement.filter, Some(IndexFilter::range("age", 29, i64::MAX)));
        assert!(statement.residual.is_empty());
        assert!(statement.predicate.is_none());
        assert_eq!(statement.pushed, Some(Qualifier::gt("age", 28)));
    }

    #[test]
    fn test_unindexed_field_stays_residual() {
        let cache = IndexCache::new();
        let statement = scan(
            StatementCompiler::new(&cache)
                .compile("test", Some("people"), None, &[Qualifier::eq("color", "blue")])
                .unwrap(),
        );

        assert!(statement.is_full_scan());
        assert_eq!(statement.residual, vec![Qualifier::eq("color", "blue")]);
        assert!(statement.accepts(json!({"color": "blue"}).as_object().unwrap()));
        assert!(!statement.accepts(json!({"color": "red"}).as_object().unwrap()));
    }

    #[test]
    fn test_first_eligible_top_level_wins() {
        let cache = cache_with(vec![
            index(Some("people"), "age", IndexType::Numeric),
            index(Some("people"), "height", IndexType::Numeric),
        ]);
        let qualifiers = [
            Qualifier::starts_with("name", "A"),
            Qualifier::lt("height", 200),
            Qualifier::gt("age", 1),
        ];
        let statement = scan(
            StatementCompiler::new(&cache)
                .compile("test", Some("people"), None, &qualifiers)
                .unwrap(),
        );

        assert_eq!(statement.filter, Some(IndexFilter::range("height", i64::MIN, 199)));
        assert_eq!(
            statement.residual,
            vec![Qualifier::starts_with("name", "A"), Qualifier::gt("age", 1)]
        );
    }

    #[test]
    fn test_and_child_wins_at_its_position() {
        let cache = cache_with(vec![
            index(Some("people"), "age", IndexType::Numeric),
            index(Some("people"), "height", IndexType::Numeric),
        ]);
        let qualifiers = [
            Qualifier::and(vec![Qualifier::eq("age", 5), Qualifier::eq("x", 1)]),
            Qualifier::eq("height", 180),
        ];
        let statement = scan(
            StatementCompiler::new(&cache)
                .compile("test", Some("people"), None, &qualifiers)
                .unwrap(),
        );

        assert_eq!(statement.pushed, Some(Qualifier::eq("age", 5)));
        assert_eq!(
            statement.filter,
            Some(IndexFilter::equal("age", FilterValue::Integer(5)))
        );
        assert_eq!(
            statement.residual,
            vec![Qualifier::eq("x", 1), Qualifier::eq("height", 180)]
        );
    }

    #[test]
    fn test_and_child_extraction() {
        let cache = cache_with(vec![index(Some("people"), "age", IndexType::Numeric)]);
        let compiler = StatementCompiler::new(&cache);

        let two = [Qualifier::and(vec![Qualifier::eq("name", "x"), Qualifier::eq("age", 5)])];
        let statement = scan(compiler.compile("test", Some("people"), None, &two).unwrap());
        assert_eq!(statement.pushed, Some(Qualifier::eq("age", 5)));
        assert_eq!(statement.residual, vec![Qualifier::eq("name", "x")]);

        let three = [Qualifier::and(vec![
            Qualifier::eq("age", 5),
            Qualifier::eq("a", 1),
            Qualifier::eq("b", 2),
        ])];
        let statement = scan(compiler.compile("test", Some("people"), None, &three).unwrap());
        assert_eq!(
            statement.residual,
            vec![Qualifier::and(vec![Qualifier::eq("a", 1), Qualifier::eq("b", 2)])]
        );

        let alone = [Qualifier::and(vec![Qualifier::eq("age", 5)])];
        let statement = scan(compiler.compile("test", Some("people"), None, &alone).unwrap());
        assert!(statement.residual.is_empty());
        assert!(statement.predicate.is_none());

        // caller's qualifiers are untouched
        assert_eq!(two[0].children().len(), 2);
    }

    #[test]
    fn test_or_never_pushed() {
        let cache = cache_with(vec![index(Some("people"), "age", IndexType::Numeric)]);
        let qualifiers = [Qualifier::or(vec![Qualifier::eq("age", 5), Qualifier::eq("age", 6)])];
        let statement = scan(
            StatementCompiler::new(&cache)
                .compile("test", Some("people"), None, &qualifiers)
                .unwrap(),
        );

        assert!(statement.is_full_scan());
        assert_eq!(statement.residual, qualifiers.to_vec());
    }

    #[test]
    fn test_case_insensitive_equality_not_pushed() {
        let cache = cache_with(vec![index(Some("people"), "name", IndexType::String)]);
        let statement = scan(
            StatementCompiler::new(&cache)
                .compile(
                    "test",
                    Some("people"),
                    None,
                    &[Qualifier::eq("name", "alice").ignoring_case()],
                )
                .unwrap(),
        );
        assert!(statement.is_full_scan());
        assert!(statement.accepts(json!({"name": "ALICE"}).as_object().unwrap()));
    }

    #[test]
    fn test_namespace_wide_index_covers_set() {
        let cache = cache_with(vec![index(None, "age", IndexType::Numeric)]);
        let statement = scan(
            StatementCompiler::new(&cache)
                .compile("test", Some("people"), None, &[Qualifier::eq("age", 5)])
                .unwrap(),
        );
        assert!(!statement.is_full_scan());
    }

    #[test]
    fn test_index_in_other_set_is_ignored() {
        let cache = cache_with(vec![index(Some("cars"), "age", IndexType::Numeric)]);
        let statement = scan(
            StatementCompiler::new(&cache)
                .compile("test", Some("people"), None, &[Qualifier::eq("age", 5)])
                .unwrap(),
        );
        assert!(statement.is_full_scan());
    }

    #[test]
    fn test_native_filter_disables_pushdown() {
        let cache = cache_with(vec![index(Some("people"), "age", IndexType::Numeric)]);
        let native = IndexFilter::range("height", 100, 200);
        let statement = scan(
            StatementCompiler::new(&cache)
                .compile(
                    "test",
                    Some("people"),
                    Some(native.clone()),
                    &[Qualifier::eq("age", 5)],
                )
                .unwrap(),
        );

        assert_eq!(statement.filter, Some(native));
        assert_eq!(statement.pushed, None);
        assert_eq!(statement.residual, vec![Qualifier::eq("age", 5)]);
    }

    #[test]
    fn test_native_filter_alone_is_valid() {
        let cache = IndexCache::new();
        let statement = scan(
            StatementCompiler::new(&cache)
                .compile("test", None, Some(IndexFilter::range("age", 0, 9)), &[])
                .unwrap(),
        );
        assert!(statement.predicate.is_none());
    }

    #[test]
    fn test_empty_statement_rejected() {
        let cache = IndexCache::new();
        let err = StatementCompiler::new(&cache)
            .compile("test", Some("people"), None, &[])
            .unwrap_err();
        assert_eq!(err.code(), "AERO_QUERY_EMPTY_STATEMENT");
    }

    #[test]
    fn test_malformed_qualifier_rejected() {
        let cache = IndexCache::new();
        let err = StatementCompiler::new(&cache)
            .compile("test", None, None, &[Qualifier::and(vec![])])
            .unwrap_err();
        assert_eq!(err.code(), "AERO_QUERY_MALFORMED");
    }

    #[test]
    fn test_inexpressible_operand_falls_back_to_next_candidate() {
        let cache = cache_with(vec![
            index(Some("people"), "score", IndexType::Numeric),
            index(Some("people"), "age", IndexType::Numeric),
        ]);
        let qualifiers = [Qualifier::gt("score", 1.5), Qualifier::gt("age", 28)];
        let statement = scan(
            StatementCompiler::new(&cache)
                .compile("test", Some("people"), None, &qualifiers)
                .unwrap(),
        );
        assert_eq!(statement.pushed, Some(Qualifier::gt("age", 28)));
        assert_eq!(statement.residual, vec![Qualifier::gt("score", 1.5)]);
    }
}
