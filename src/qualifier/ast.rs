//! Qualifier expression tree
//!
//! Leaves compare one bin against 1-2 operands, composites combine children
//! with AND / OR, and the key qualifier names a single primary key.
//! Qualifiers are immutable once built.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{QualifierError, QualifierResult};
use super::operation::FilterOperation;

/// A leaf comparison against one record bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FieldQualifierRepr", into = "FieldQualifierRepr")]
pub struct FieldQualifier {
    field: String,
    operation: FilterOperation,
    ignore_case: bool,
    value: Value,
    value2: Option<Value>,
}

impl FieldQualifier {
    /// Creates a validated leaf qualifier.
    ///
    /// `values` must hold exactly `operation.arity()` operands.
    pub fn new(
        field: impl Into<String>,
        operation: FilterOperation,
        values: Vec<Value>,
    ) -> QualifierResult<Self> {
        let field = field.into();
        if operation.is_composite() {
            return Err(QualifierError::CompositeOnField { field, operation });
        }
        if values.len() != operation.arity() {
            return Err(QualifierError::Arity {
                field,
                operation,
                expected: operation.arity(),
                actual: values.len(),
            });
        }

        let mut values = values.into_iter();
        let qualifier = Self {
            field,
            operation,
            ignore_case: false,
            value: values.next().unwrap_or(Value::Null),
            value2: values.next(),
        };
        qualifier.validate()?;
        Ok(qualifier)
    }

    fn unary(field: impl Into<String>, operation: FilterOperation, value: Value) -> Self {
        Self {
            field: field.into(),
            operation,
            ignore_case: false,
            value,
            value2: None,
        }
    }

    fn binary(field: impl Into<String>, operation: FilterOperation, low: Value, high: Value) -> Self {
        Self {
            field: field.into(),
            operation,
            ignore_case: false,
            value: low,
            value2: Some(high),
        }
    }

    /// Bin name this qualifier targets
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operation(&self) -> FilterOperation {
        self.operation
    }

    /// First operand
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Second operand (range upper bound)
    pub fn value2(&self) -> Option<&Value> {
        self.value2.as_ref()
    }

    /// Raw case-sensitivity flag as supplied by the caller
    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Returns true if this is a string comparison that ignores case.
    ///
    /// The flag only has meaning for string operands.
    pub fn is_case_insensitive(&self) -> bool {
        self.ignore_case && self.value.is_string()
    }

    /// Checks leaf invariants: non-empty field and matching operand count
    pub fn validate(&self) -> QualifierResult<()> {
        if self.field.trim().is_empty() {
            return Err(QualifierError::EmptyField(self.operation));
        }
        if self.operation.is_composite() {
            return Err(QualifierError::CompositeOnField {
                field: self.field.clone(),
                operation: self.operation,
            });
        }
        let actual = 1 + usize::from(self.value2.is_some());
        if actual != self.operation.arity() {
            return Err(QualifierError::Arity {
                field: self.field.clone(),
                operation: self.operation,
                expected: self.operation.arity(),
                actual,
            });
        }
        Ok(())
    }
}

impl fmt::Display for FieldQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operation, self.value)?;
        if let Some(high) = &self.value2 {
            write!(f, " {}", high)?;
        }
        if self.ignore_case {
            write!(f, " (ignore case)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FieldQualifierRepr {
    field: String,
    operation: FilterOperation,
    #[serde(default)]
    ignore_case: bool,
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value2: Option<Value>,
}

impl TryFrom<FieldQualifierRepr> for FieldQualifier {
    type Error = QualifierError;

    fn try_from(repr: FieldQualifierRepr) -> Result<Self, Self::Error> {
        let qualifier = Self {
            field: repr.field,
            operation: repr.operation,
            ignore_case: repr.ignore_case,
            value: repr.value,
            value2: repr.value2,
        };
        qualifier.validate()?;
        Ok(qualifier)
    }
}

impl From<FieldQualifier> for FieldQualifierRepr {
    fn from(q: FieldQualifier) -> Self {
        Self {
            field: q.field,
            operation: q.operation,
            ignore_case: q.ignore_case,
            value: q.value,
            value2: q.value2,
        }
    }
}

/// A node in the filter-expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualifier {
    /// Primary-key lookup; must be the only qualifier of a query
    Key(Value),
    /// Leaf comparison on a bin
    Field(FieldQualifier),
    /// Conjunction of children
    And(Vec<Qualifier>),
    /// Disjunction of children
    Or(Vec<Qualifier>),
}

impl Qualifier {
    /// Primary-key qualifier
    pub fn key(value: impl Into<Value>) -> Self {
        Qualifier::Key(value.into())
    }

    /// Equality: field = value
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, FilterOperation::Eq, value)
    }

    /// Greater than: field > value
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, FilterOperation::Gt, value)
    }

    /// Greater than or equal: field >= value
    pub fn gteq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, FilterOperation::Gteq, value)
    }

    /// Less than: field < value
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, FilterOperation::Lt, value)
    }

    /// Less than or equal: field <= value
    pub fn lteq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, FilterOperation::Lteq, value)
    }

    /// Inclusive range: low <= field <= high
    pub fn between(
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::range(field, FilterOperation::Between, low, high)
    }

    pub fn starts_with(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::leaf(field, FilterOperation::StartWith, prefix.into())
    }

    pub fn ends_with(field: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::leaf(field, FilterOperation::EndsWith, suffix.into())
    }

    pub fn containing(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::leaf(field, FilterOperation::Containing, needle.into())
    }

    /// Membership: field equals one of `values`
    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::leaf(field, FilterOperation::In, Value::Array(values))
    }

    pub fn list_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, FilterOperation::ListContains, value)
    }

    pub fn list_between(
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::range(field, FilterOperation::ListBetween, low, high)
    }

    pub fn map_keys_contains(field: impl Into<String>, key: impl Into<Value>) -> Self {
        Self::leaf(field, FilterOperation::MapKeysContains, key)
    }

    pub fn map_values_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, FilterOperation::MapValuesContains, value)
    }

    pub fn map_keys_between(
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::range(field, FilterOperation::MapKeysBetween, low, high)
    }

    pub fn map_values_between(
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::range(field, FilterOperation::MapValuesBetween, low, high)
    }

    /// Point-in-region test; `region` is a GeoJSON Polygon or AeroCircle
    pub fn geo_within(field: impl Into<String>, region: impl Into<Value>) -> Self {
        Self::leaf(field, FilterOperation::GeoWithin, region)
    }

    pub fn and(children: Vec<Qualifier>) -> Self {
        Qualifier::And(children)
    }

    pub fn or(children: Vec<Qualifier>) -> Self {
        Qualifier::Or(children)
    }

    fn leaf(field: impl Into<String>, operation: FilterOperation, value: impl Into<Value>) -> Self {
        Qualifier::Field(FieldQualifier::unary(field, operation, value.into()))
    }

    fn range(
        field: impl Into<String>,
        operation: FilterOperation,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Qualifier::Field(FieldQualifier::binary(
            field,
            operation,
            low.into(),
            high.into(),
        ))
    }

    /// Marks a string comparison as case-insensitive. No effect on composites.
    pub fn ignoring_case(self) -> Self {
        match self {
            Qualifier::Field(mut leaf) => {
                leaf.ignore_case = true;
                Qualifier::Field(leaf)
            }
            other => other,
        }
    }

    /// Operation of this node (EQ for the key qualifier)
    pub fn operation(&self) -> FilterOperation {
        match self {
            Qualifier::Key(_) => FilterOperation::Eq,
            Qualifier::Field(leaf) => leaf.operation,
            Qualifier::And(_) => FilterOperation::And,
            Qualifier::Or(_) => FilterOperation::Or,
        }
    }

    /// Target field, absent for composites and the key qualifier
    pub fn field(&self) -> Option<&str> {
        match self {
            Qualifier::Field(leaf) => Some(&leaf.field),
            _ => None,
        }
    }

    /// Children of a composite, empty for leaves
    pub fn children(&self) -> &[Qualifier] {
        match self {
            Qualifier::And(children) | Qualifier::Or(children) => children,
            _ => &[],
        }
    }

    /// Returns true if a key qualifier appears anywhere in this tree
    pub fn contains_key(&self) -> bool {
        match self {
            Qualifier::Key(_) => true,
            Qualifier::Field(_) => false,
            Qualifier::And(children) | Qualifier::Or(children) => {
                children.iter().any(Qualifier::contains_key)
            }
        }
    }

    /// Validates the whole tree.
    ///
    /// Composites need at least one child; leaves need a field and the
    /// operand count their operation requires.
    pub fn validate(&self) -> QualifierResult<()> {
        match self {
            Qualifier::Key(value) => {
                if value.is_null() {
                    return Err(QualifierError::NullKey);
                }
                Ok(())
            }
            Qualifier::Field(leaf) => leaf.validate(),
            Qualifier::And(children) | Qualifier::Or(children) => {
                if children.is_empty() {
                    return Err(QualifierError::EmptyComposite(self.operation()));
                }
                children.iter().try_for_each(Qualifier::validate)
            }
        }
    }
}

impl From<FieldQualifier> for Qualifier {
    fn from(leaf: FieldQualifier) -> Self {
        Qualifier::Field(leaf)
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::Key(value) => write!(f, "KEY = {}", value),
            Qualifier::Field(leaf) => write!(f, "{}", leaf),
            Qualifier::And(children) | Qualifier::Or(children) => {
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", self.operation())?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}
