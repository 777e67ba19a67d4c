//! Query engine
//!
//! Compiles qualifiers against the current index snapshot and runs the
//! resulting plan against a `RecordStore`.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::QueryConfig;
use crate::index::IndexCache;
use crate::planner::{ExplainPlan, IndexFilter, QueryPlan, Statement, StatementCompiler};
use crate::qualifier::Qualifier;
use crate::store::RecordStore;

use super::errors::{QueryError, QueryResult};
use super::iter::RecordIter;

/// Runs qualifier queries against a record store
pub struct QueryEngine<S: RecordStore> {
    store: Arc<S>,
    cache: Arc<IndexCache>,
    scans_enabled: bool,
}

impl<S: RecordStore> QueryEngine<S> {
    pub fn new(store: Arc<S>, cache: Arc<IndexCache>, config: &QueryConfig) -> Self {
        Self {
            store,
            cache,
            scans_enabled: config.scans_enabled,
        }
    }

    /// Runs a query.
    ///
    /// A single key qualifier becomes a point fetch. Anything else is
    /// compiled into a store query; if that query has no index filter and
    /// full scans are disabled, `UnsafeFullScan` is returned before the
    /// store is contacted.
    pub fn select(
        &self,
        namespace: &str,
        set: Option<&str>,
        native_filter: Option<IndexFilter>,
        qualifiers: &[Qualifier],
    ) -> QueryResult<RecordIter<S::Cursor>> {
        let plan =
            StatementCompiler::new(&self.cache).compile(namespace, set, native_filter, qualifiers)?;
        self.execute(plan)
    }

    /// Reads every record of a namespace or set. Subject to the same scan
    /// guard as `select`.
    pub fn scan_all(&self, namespace: &str, set: Option<&str>) -> QueryResult<RecordIter<S::Cursor>> {
        self.execute(QueryPlan::Scan(Statement::full_scan(namespace, set)))
    }

    /// Compiles a query and describes its plan without contacting the store
    pub fn explain(
        &self,
        namespace: &str,
        set: Option<&str>,
        native_filter: Option<IndexFilter>,
        qualifiers: &[Qualifier],
    ) -> ExplainPlan {
        let compiled = StatementCompiler::new(&self.cache)
            .compile(namespace, set, native_filter, qualifiers)
            .map_err(QueryError::from)
            .and_then(|plan| self.check_scan(&plan).map(|()| plan));

        match compiled {
            Ok(plan) => ExplainPlan::from_plan(namespace, set, &plan),
            Err(err) => ExplainPlan::rejected(namespace, set, err.code(), err.to_string()),
        }
    }

    fn execute(&self, plan: QueryPlan) -> QueryResult<RecordIter<S::Cursor>> {
        self.check_scan(&plan)?;

        match plan {
            QueryPlan::PointLookup(key) => {
                debug!(key = %key, "point lookup");
                let record = self.store.get(&key)?;
                Ok(RecordIter::single(record))
            }
            QueryPlan::Scan(statement) => {
                match &statement.filter {
                    Some(filter) => debug!(
                        namespace = %statement.namespace,
                        set = statement.set.as_deref().unwrap_or("*"),
                        filter = %filter,
                        residual = statement.residual.len(),
                        "index query"
                    ),
                    None => info!(
                        namespace = %statement.namespace,
                        set = statement.set.as_deref().unwrap_or("*"),
                        residual = statement.residual.len(),
                        "full scan"
                    ),
                }
                let cursor = self.store.query(&statement.scan_request())?;
                Ok(RecordIter::streaming(cursor, statement.predicate))
            }
        }
    }

    fn check_scan(&self, plan: &QueryPlan) -> QueryResult<()> {
        match plan.statement() {
            Some(statement) if statement.is_full_scan() && !self.scans_enabled => {
                Err(QueryError::UnsafeFullScan {
                    namespace: statement.namespace.clone(),
                    set: statement.set.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}
