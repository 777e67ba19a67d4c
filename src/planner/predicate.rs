//! Client-side residual predicate
//!
//! Qualifiers not answered by the index filter are compiled once into a
//! `PredicateExpr` and evaluated against every record the store returns.
//!
//! # Evaluation rules
//!
//! - Missing bins and nulls never match
//! - Numbers compare numerically, strings lexicographically; no coercion
//!   between the two
//! - String operations compile to anchored, escaped regexes
//! - Collection operations match if any element (key, value) matches

use std::cmp::Ordering;
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use crate::qualifier::{
    CollectionShape, Comparison, FieldQualifier, Junction, MembershipTest, OperationCategory,
    Qualifier, QualifierError, StringMatch,
};

use super::errors::{CompilerError, CompilerResult};
use super::geo::GeoRegion;

/// Test applied to one scalar value
#[derive(Debug, Clone, PartialEq)]
pub enum ValueTest {
    Eq(Value),
    Gt(Value),
    Gteq(Value),
    Lt(Value),
    Lteq(Value),
    /// Inclusive on both ends
    Between(Value, Value),
    In(Vec<Value>),
}

impl ValueTest {
    pub fn matches(&self, actual: &Value) -> bool {
        if actual.is_null() {
            return false;
        }
        match self {
            ValueTest::Eq(expected) => equals(actual, expected),
            ValueTest::Gt(bound) => compare(actual, bound) == Some(Ordering::Greater),
            ValueTest::Gteq(bound) => {
                matches!(compare(actual, bound), Some(Ordering::Greater | Ordering::Equal))
            }
            ValueTest::Lt(bound) => compare(actual, bound) == Some(Ordering::Less),
            ValueTest::Lteq(bound) => {
                matches!(compare(actual, bound), Some(Ordering::Less | Ordering::Equal))
            }
            ValueTest::Between(low, high) => {
                matches!(compare(actual, low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(actual, high), Some(Ordering::Less | Ordering::Equal))
            }
            ValueTest::In(candidates) => candidates.iter().any(|c| equals(actual, c)),
        }
    }

    /// First operand, used to decide how map keys are read
    fn operand(&self) -> Option<&Value> {
        match self {
            ValueTest::Eq(v)
            | ValueTest::Gt(v)
            | ValueTest::Gteq(v)
            | ValueTest::Lt(v)
            | ValueTest::Lteq(v)
            | ValueTest::Between(v, _) => Some(v),
            ValueTest::In(values) => values.first(),
        }
    }
}

impl fmt::Display for ValueTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueTest::Eq(v) => write!(f, "== {}", v),
            ValueTest::Gt(v) => write!(f, "> {}", v),
            ValueTest::Gteq(v) => write!(f, ">= {}", v),
            ValueTest::Lt(v) => write!(f, "< {}", v),
            ValueTest::Lteq(v) => write!(f, "<= {}", v),
            ValueTest::Between(low, high) => write!(f, "BETWEEN {} AND {}", low, high),
            ValueTest::In(values) => write!(f, "IN {}", Value::Array(values.clone())),
        }
    }
}

fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn equals(actual: &Value, expected: &Value) -> bool {
    compare(actual, expected) == Some(Ordering::Equal) || actual == expected
}

/// Compiled residual predicate
#[derive(Debug, Clone)]
pub enum PredicateExpr {
    And(Vec<PredicateExpr>),
    Or(Vec<PredicateExpr>),
    Compare {
        bin: String,
        test: ValueTest,
    },
    Pattern {
        bin: String,
        kind: StringMatch,
        pattern: Regex,
    },
    Collection {
        bin: String,
        shape: CollectionShape,
        test: ValueTest,
    },
    GeoWithin {
        bin: String,
        region: GeoRegion,
    },
}

impl PredicateExpr {
    /// Compiles the conjunction of `qualifiers`; `None` when there are none
    pub fn conjunction(qualifiers: &[Qualifier]) -> CompilerResult<Option<Self>> {
        let mut clauses = qualifiers
            .iter()
            .map(Self::from_qualifier)
            .collect::<CompilerResult<Vec<_>>>()?;

        Ok(match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(PredicateExpr::And(clauses)),
        })
    }

    /// Compiles one qualifier tree
    pub fn from_qualifier(qualifier: &Qualifier) -> CompilerResult<Self> {
        match qualifier {
            Qualifier::Key(_) => Err(CompilerError::KeyQualifierNotAlone),
            Qualifier::Field(leaf) => Self::from_leaf(leaf),
            Qualifier::And(children) => children
                .iter()
                .map(Self::from_qualifier)
                .collect::<CompilerResult<Vec<_>>>()
                .map(PredicateExpr::And),
            Qualifier::Or(children) => children
                .iter()
                .map(Self::from_qualifier)
                .collect::<CompilerResult<Vec<_>>>()
                .map(PredicateExpr::Or),
        }
    }

    fn from_leaf(leaf: &FieldQualifier) -> CompilerResult<Self> {
        let bin = leaf.field().to_string();

        match leaf.operation().category() {
            OperationCategory::Comparison(Comparison::Eq) if leaf.is_case_insensitive() => {
                Self::pattern(leaf, StringMatch::Equals)
            }
            OperationCategory::Comparison(comparison) => Ok(PredicateExpr::Compare {
                bin,
                test: value_test(leaf, comparison)?,
            }),
            OperationCategory::StringMatch(kind) => Self::pattern(leaf, kind),
            OperationCategory::Collection(shape, membership) => {
                let test = match membership {
                    MembershipTest::Contains => ValueTest::Eq(leaf.value().clone()),
                    MembershipTest::Between => {
                        ValueTest::Between(leaf.value().clone(), upper_bound(leaf)?)
                    }
                };
                Ok(PredicateExpr::Collection { bin, shape, test })
            }
            OperationCategory::Spatial => GeoRegion::from_value(leaf.value())
                .map(|region| PredicateExpr::GeoWithin { bin, region })
                .ok_or_else(|| {
                    unsupported(leaf, "region must be a GeoJSON Polygon or AeroCircle")
                }),
            OperationCategory::Composite(_) => Err(QualifierError::CompositeOnField {
                field: bin,
                operation: leaf.operation(),
            }
            .into()),
        }
    }

    fn pattern(leaf: &FieldQualifier, kind: StringMatch) -> CompilerResult<Self> {
        let Some(text) = leaf.value().as_str() else {
            return Err(unsupported(leaf, "string operations need a string operand"));
        };

        let escaped = regex::escape(text);
        let source = match kind {
            StringMatch::Equals => format!("^{}$", escaped),
            StringMatch::Prefix => format!("^{}", escaped),
            StringMatch::Suffix => format!("{}$", escaped),
            StringMatch::Contains => escaped,
        };
        let pattern = RegexBuilder::new(&source)
            .case_insensitive(leaf.ignore_case())
            .build()
            .map_err(|err| unsupported(leaf, err.to_string()))?;

        Ok(PredicateExpr::Pattern {
            bin: leaf.field().to_string(),
            kind,
            pattern,
        })
    }

    /// Evaluates the predicate against a record's bins
    pub fn matches(&self, bins: &Map<String, Value>) -> bool {
        match self {
            PredicateExpr::And(clauses) => clauses.iter().all(|c| c.matches(bins)),
            PredicateExpr::Or(clauses) => clauses.iter().any(|c| c.matches(bins)),
            PredicateExpr::Compare { bin, test } => bins.get(bin).map_or(false, |v| test.matches(v)),
            PredicateExpr::Pattern { bin, pattern, .. } => bins
                .get(bin)
                .and_then(Value::as_str)
                .map_or(false, |s| pattern.is_match(s)),
            PredicateExpr::Collection { bin, shape, test } => match (shape, bins.get(bin)) {
                (CollectionShape::List, Some(Value::Array(items))) => {
                    items.iter().any(|item| test.matches(item))
                }
                (CollectionShape::MapKeys, Some(Value::Object(map))) => map
                    .keys()
                    .any(|key| test.matches(&map_key(key, test.operand()))),
                (CollectionShape::MapValues, Some(Value::Object(map))) => {
                    map.values().any(|value| test.matches(value))
                }
                _ => false,
            },
            PredicateExpr::GeoWithin { bin, region } => {
                bins.get(bin).map_or(false, |point| region.contains(point))
            }
        }
    }

    pub fn junction(&self) -> Option<Junction> {
        match self {
            PredicateExpr::And(_) => Some(Junction::And),
            PredicateExpr::Or(_) => Some(Junction::Or),
            _ => None,
        }
    }
}

impl fmt::Display for PredicateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateExpr::And(clauses) | PredicateExpr::Or(clauses) => {
                let joiner = if self.junction() == Some(Junction::And) {
                    " AND "
                } else {
                    " OR "
                };
                write!(f, "(")?;
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        f.write_str(joiner)?;
                    }
                    write!(f, "{}", clause)?;
                }
                write!(f, ")")
            }
            PredicateExpr::Compare { bin, test } => write!(f, "{} {}", bin, test),
            PredicateExpr::Pattern { bin, pattern, .. } => write!(f, "{} =~ /{}/", bin, pattern),
            PredicateExpr::Collection { bin, shape, test } => {
                let part = match shape {
                    CollectionShape::List => "list",
                    CollectionShape::MapKeys => "mapkeys",
                    CollectionShape::MapValues => "mapvalues",
                };
                write!(f, "ANY {}({}) {}", part, bin, test)
            }
            PredicateExpr::GeoWithin { bin, .. } => write!(f, "{} WITHIN region", bin),
        }
    }
}

fn value_test(leaf: &FieldQualifier, comparison: Comparison) -> CompilerResult<ValueTest> {
    let value = leaf.value().clone();
    let ordered = |value: Value| {
        if value.is_number() || value.is_string() {
            Ok(value)
        } else {
            Err(unsupported(leaf, "ordered comparisons need a number or string operand"))
        }
    };

    match comparison {
        Comparison::Eq => Ok(ValueTest::Eq(value)),
        Comparison::Gt => ordered(value).map(ValueTest::Gt),
        Comparison::Gteq => ordered(value).map(ValueTest::Gteq),
        Comparison::Lt => ordered(value).map(ValueTest::Lt),
        Comparison::Lteq => ordered(value).map(ValueTest::Lteq),
        Comparison::Between => Ok(ValueTest::Between(ordered(value)?, ordered(upper_bound(leaf)?)?)),
        Comparison::In => match value {
            Value::Array(candidates) => Ok(ValueTest::In(candidates)),
            _ => Err(unsupported(leaf, "IN needs an array operand")),
        },
    }
}

fn upper_bound(leaf: &FieldQualifier) -> CompilerResult<Value> {
    leaf.value2().cloned().ok_or_else(|| {
        QualifierError::Arity {
            field: leaf.field().to_string(),
            operation: leaf.operation(),
            expected: 2,
            actual: 1,
        }
        .into()
    })
}

/// Map keys are JSON strings; read them as numbers when the operand is one
fn map_key(key: &str, operand: Option<&Value>) -> Value {
    if operand.map_or(false, Value::is_number) {
        if let Ok(n) = key.parse::<i64>() {
            return Value::from(n);
        }
        if let Ok(n) = key.parse::<f64>() {
            return Value::from(n);
        }
    }
    Value::String(key.to_string())
}

fn unsupported(leaf: &FieldQualifier, reason: impl Into<String>) -> CompilerError {
    CompilerError::UnsupportedOperand {
        field: leaf.field().to_string(),
        operation: leaf.operation(),
        reason: reason.into(),
    }
}
