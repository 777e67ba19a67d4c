//! Server-side secondary-index filters
//!
//! A statement carries at most one of these. They mirror what the store's
//! index query can express: integer/string equality, inclusive integer
//! range, and geo containment.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::qualifier::{FieldQualifier, FilterOperation};

use super::geo::GeoRegion;

/// Operand of an equality filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Integer(i64),
    String(String),
}

impl FilterValue {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(FilterValue::Integer),
            Value::String(s) => Some(FilterValue::String(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Integer(n) => write!(f, "{}", n),
            FilterValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Filter evaluated by the store against a secondary index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexFilter {
    Equal { bin: String, value: FilterValue },
    /// Inclusive on both ends
    Range { bin: String, begin: i64, end: i64 },
    /// `region` is GeoJSON text
    GeoWithin { bin: String, region: String },
}

impl IndexFilter {
    pub fn equal(bin: impl Into<String>, value: FilterValue) -> Self {
        IndexFilter::Equal {
            bin: bin.into(),
            value,
        }
    }

    pub fn range(bin: impl Into<String>, begin: i64, end: i64) -> Self {
        IndexFilter::Range {
            bin: bin.into(),
            begin,
            end,
        }
    }

    pub fn geo_within(bin: impl Into<String>, region: impl Into<String>) -> Self {
        IndexFilter::GeoWithin {
            bin: bin.into(),
            region: region.into(),
        }
    }

    /// Bin the filter reads
    pub fn bin(&self) -> &str {
        match self {
            IndexFilter::Equal { bin, .. }
            | IndexFilter::Range { bin, .. }
            | IndexFilter::GeoWithin { bin, .. } => bin,
        }
    }

    /// Translates a leaf qualifier, if the index query can express it.
    ///
    /// Returns `None` for non-pushdown operations, case-insensitive string
    /// comparisons, and operands an index filter cannot carry (floats,
    /// bounds that overflow, inverted ranges).
    pub fn from_qualifier(leaf: &FieldQualifier) -> Option<Self> {
        if !leaf.operation().is_pushdown_candidate() || leaf.is_case_insensitive() {
            return None;
        }

        let bin = leaf.field();
        let int = |value: &Value| value.as_i64();

        match leaf.operation() {
            FilterOperation::Eq => FilterValue::from_json(leaf.value()).map(|v| Self::equal(bin, v)),
            FilterOperation::Gt => int(leaf.value())?
                .checked_add(1)
                .map(|begin| Self::range(bin, begin, i64::MAX)),
            FilterOperation::Gteq => int(leaf.value()).map(|begin| Self::range(bin, begin, i64::MAX)),
            FilterOperation::Lt => int(leaf.value())?
                .checked_sub(1)
                .map(|end| Self::range(bin, i64::MIN, end)),
            FilterOperation::Lteq => int(leaf.value()).map(|end| Self::range(bin, i64::MIN, end)),
            FilterOperation::Between => {
                let begin = int(leaf.value())?;
                let end = int(leaf.value2()?)?;
                (begin <= end).then(|| Self::range(bin, begin, end))
            }
            FilterOperation::GeoWithin => {
                GeoRegion::from_value(leaf.value())?;
                let region = match leaf.value() {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                Some(Self::geo_within(bin, region))
            }
            _ => None,
        }
    }

    /// Evaluates the filter the way the server would
    pub fn matches(&self, bins: &Map<String, Value>) -> bool {
        match self {
            IndexFilter::Equal { bin, value } => match (bins.get(bin), value) {
                (Some(Value::Number(n)), FilterValue::Integer(expected)) => {
                    n.as_i64() == Some(*expected)
                }
                (Some(Value::String(s)), FilterValue::String(expected)) => s == expected,
                _ => false,
            },
            IndexFilter::Range { bin, begin, end } => bins
                .get(bin)
                .and_then(Value::as_i64)
                .map_or(false, |n| (*begin..=*end).contains(&n)),
            IndexFilter::GeoWithin { bin, region } => {
                match (bins.get(bin), GeoRegion::from_text(region)) {
                    (Some(point), Some(region)) => region.contains(point),
                    _ => false,
                }
            }
        }
    }
}

impl fmt::Display for IndexFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexFilter::Equal { bin, value } => write!(f, "equal({}, {})", bin, value),
            IndexFilter::Range { bin, begin, end } => write!(f, "range({}, {}, {})", bin, begin, end),
            IndexFilter::GeoWithin { bin, region } => write!(f, "geo_within({}, {})", bin, region),
        }
    }
}
