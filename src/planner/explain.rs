//! Explain output for compiled plans
//!
//! Describes how a query would reach the store without issuing it.

use std::fmt;

use serde::Serialize;

use super::compiler::QueryPlan;

/// Explain plan output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplainPlan {
    /// Whether compilation succeeded and the query would run
    pub accepted: bool,
    pub namespace: String,
    pub set: Option<String>,
    /// POINT_LOOKUP, INDEX_QUERY or FULL_SCAN (if accepted)
    pub access_path: Option<String>,
    /// Primary key (point lookups)
    pub key: Option<String>,
    /// Filter sent to the store
    pub index_filter: Option<String>,
    /// Qualifier the filter was derived from
    pub pushed_qualifier: Option<String>,
    /// Predicate evaluated client-side
    pub residual: Option<String>,
    pub rejection_code: Option<String>,
    pub rejection_reason: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a compiled query
    pub fn from_plan(namespace: &str, set: Option<&str>, plan: &QueryPlan) -> Self {
        let mut explain = Self::empty(namespace, set);
        explain.accepted = true;
        explain.access_path = Some(plan.access_path().as_str().to_string());

        match plan {
            QueryPlan::PointLookup(key) => explain.key = Some(key.user_key.to_string()),
            QueryPlan::Scan(statement) => {
                explain.index_filter = statement.filter.as_ref().map(ToString::to_string);
                explain.pushed_qualifier = statement.pushed.as_ref().map(ToString::to_string);
                explain.residual = statement.predicate.as_ref().map(ToString::to_string);
            }
        }
        explain
    }

    /// Creates an explain plan for a rejected query
    pub fn rejected(namespace: &str, set: Option<&str>, code: &str, reason: String) -> Self {
        let mut explain = Self::empty(namespace, set);
        explain.rejection_code = Some(code.to_string());
        explain.rejection_reason = Some(reason);
        explain
    }

    fn empty(namespace: &str, set: Option<&str>) -> Self {
        Self {
            accepted: false,
            namespace: namespace.to_string(),
            set: set.map(str::to_string),
            access_path: None,
            key: None,
            index_filter: None,
            pushed_qualifier: None,
            residual: None,
            rejection_code: None,
            rejection_reason: None,
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Target: {}/{}",
            self.namespace,
            self.set.as_deref().unwrap_or("*")
        )?;

        if !self.accepted {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
            return Ok(());
        }

        writeln!(f, "Status: ACCEPTED")?;
        if let Some(path) = &self.access_path {
            writeln!(f, "Access Path: {}", path)?;
        }
        if let Some(key) = &self.key {
            writeln!(f, "Key: {}", key)?;
        }
        if let Some(filter) = &self.index_filter {
            writeln!(f, "Index Filter: {}", filter)?;
        }
        if let Some(pushed) = &self.pushed_qualifier {
            writeln!(f, "Pushed Qualifier: {}", pushed)?;
        }
        writeln!(f, "Residual: {}", self.residual.as_deref().unwrap_or("none"))
    }
}
