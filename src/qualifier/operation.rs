//! Filter operations and their evaluation categories
//!
//! Every operation belongs to exactly one `OperationCategory`. The planner
//! translates qualifiers per category, so adding an operation forces a
//! decision in `category()` and nowhere else.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operation carried by a qualifier node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOperation {
    Eq,
    Gt,
    Gteq,
    Lt,
    Lteq,
    Between,
    StartWith,
    EndsWith,
    Containing,
    In,
    ListContains,
    ListBetween,
    MapKeysContains,
    MapValuesContains,
    MapKeysBetween,
    MapValuesBetween,
    GeoWithin,
    And,
    Or,
}

/// Scalar comparison applied to a single bin value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gteq,
    Lt,
    Lteq,
    Between,
    In,
}

/// String pattern applied to a string bin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMatch {
    /// Whole-value match, used for case-insensitive equality
    Equals,
    Prefix,
    Suffix,
    Contains,
}

/// Which part of a collection bin is inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionShape {
    List,
    MapKeys,
    MapValues,
}

/// Test applied to each element of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipTest {
    Contains,
    Between,
}

/// Boolean junction of a composite node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Junction {
    And,
    Or,
}

/// Evaluation category of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationCategory {
    /// Ordered comparison against one bin value
    Comparison(Comparison),
    /// Pattern match against a string bin
    StringMatch(StringMatch),
    /// Membership or range test over list elements, map keys or map values
    Collection(CollectionShape, MembershipTest),
    /// Point-in-region test against a GeoJSON bin
    Spatial,
    /// AND / OR over child qualifiers
    Composite(Junction),
}

impl FilterOperation {
    /// Returns the category that decides how this operation is translated
    pub fn category(self) -> OperationCategory {
        use FilterOperation as Op;
        use OperationCategory as Cat;

        match self {
            Op::Eq => Cat::Comparison(Comparison::Eq),
            Op::Gt => Cat::Comparison(Comparison::Gt),
            Op::Gteq => Cat::Comparison(Comparison::Gteq),
            Op::Lt => Cat::Comparison(Comparison::Lt),
            Op::Lteq => Cat::Comparison(Comparison::Lteq),
            Op::Between => Cat::Comparison(Comparison::Between),
            Op::In => Cat::Comparison(Comparison::In),
            Op::StartWith => Cat::StringMatch(StringMatch::Prefix),
            Op::EndsWith => Cat::StringMatch(StringMatch::Suffix),
            Op::Containing => Cat::StringMatch(StringMatch::Contains),
            Op::ListContains => Cat::Collection(CollectionShape::List, MembershipTest::Contains),
            Op::ListBetween => Cat::Collection(CollectionShape::List, MembershipTest::Between),
            Op::MapKeysContains => {
                Cat::Collection(CollectionShape::MapKeys, MembershipTest::Contains)
            }
            Op::MapKeysBetween => Cat::Collection(CollectionShape::MapKeys, MembershipTest::Between),
            Op::MapValuesContains => {
                Cat::Collection(CollectionShape::MapValues, MembershipTest::Contains)
            }
            Op::MapValuesBetween => {
                Cat::Collection(CollectionShape::MapValues, MembershipTest::Between)
            }
            Op::GeoWithin => Cat::Spatial,
            Op::And => Cat::Composite(Junction::And),
            Op::Or => Cat::Composite(Junction::Or),
        }
    }

    /// Number of operands a leaf with this operation carries (0 for composites)
    pub fn arity(self) -> usize {
        match self.category() {
            OperationCategory::Composite(_) => 0,
            OperationCategory::Comparison(Comparison::Between)
            | OperationCategory::Collection(_, MembershipTest::Between) => 2,
            _ => 1,
        }
    }

    /// Returns true for AND / OR
    pub fn is_composite(self) -> bool {
        matches!(self.category(), OperationCategory::Composite(_))
    }

    /// Returns true if a secondary-index filter can express this operation.
    ///
    /// String-only operations are excluded: the server-side filter has no
    /// prefix, suffix or substring form.
    pub fn is_pushdown_candidate(self) -> bool {
        matches!(
            self,
            FilterOperation::Eq
                | FilterOperation::Between
                | FilterOperation::Gt
                | FilterOperation::Gteq
                | FilterOperation::Lt
                | FilterOperation::Lteq
                | FilterOperation::GeoWithin
        )
    }

    /// Returns the wire name used in explain output and JSON
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperation::Eq => "EQ",
            FilterOperation::Gt => "GT",
            FilterOperation::Gteq => "GTEQ",
            FilterOperation::Lt => "LT",
            FilterOperation::Lteq => "LTEQ",
            FilterOperation::Between => "BETWEEN",
            FilterOperation::StartWith => "START_WITH",
            FilterOperation::EndsWith => "ENDS_WITH",
            FilterOperation::Containing => "CONTAINING",
            FilterOperation::In => "IN",
            FilterOperation::ListContains => "LIST_CONTAINS",
            FilterOperation::ListBetween => "LIST_BETWEEN",
            FilterOperation::MapKeysContains => "MAP_KEYS_CONTAINS",
            FilterOperation::MapValuesContains => "MAP_VALUES_CONTAINS",
            FilterOperation::MapKeysBetween => "MAP_KEYS_BETWEEN",
            FilterOperation::MapValuesBetween => "MAP_VALUES_BETWEEN",
            FilterOperation::GeoWithin => "GEO_WITHIN",
            FilterOperation::And => "AND",
            FilterOperation::Or => "OR",
        }
    }
}

impl fmt::Display for FilterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
