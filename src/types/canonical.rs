//! Canonical scalar types.
//!
//! Every column the core describes resolves to exactly one [`CanonicalType`],
//! whatever spelling the source dialect uses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of canonical scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CanonicalType {
    Char,
    Varchar,
    Integer,
    Float,
    Double,
    Boolean,
    Binary,
    Varbinary,
    Date,
    Time,
    Timestamp,
    Timestamptz,
    List,
    Map,
}

impl CanonicalType {
    /// All canonical types, in declaration order.
    pub const ALL: [CanonicalType; 14] = [
        CanonicalType::Char,
        CanonicalType::Varchar,
        CanonicalType::Integer,
        CanonicalType::Float,
        CanonicalType::Double,
        CanonicalType::Boolean,
        CanonicalType::Binary,
        CanonicalType::Varbinary,
        CanonicalType::Date,
        CanonicalType::Time,
        CanonicalType::Timestamp,
        CanonicalType::Timestamptz,
        CanonicalType::List,
        CanonicalType::Map,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalType::Char => "CHAR",
            CanonicalType::Varchar => "VARCHAR",
            CanonicalType::Integer => "INTEGER",
            CanonicalType::Float => "FLOAT",
            CanonicalType::Double => "DOUBLE",
            CanonicalType::Boolean => "BOOLEAN",
            CanonicalType::Binary => "BINARY",
            CanonicalType::Varbinary => "VARBINARY",
            CanonicalType::Date => "DATE",
            CanonicalType::Time => "TIME",
            CanonicalType::Timestamp => "TIMESTAMP",
            CanonicalType::Timestamptz => "TIMESTAMPTZ",
            CanonicalType::List => "LIST",
            CanonicalType::Map => "MAP",
        }
    }

    /// Returns true for INTEGER, FLOAT and DOUBLE.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            CanonicalType::Integer | CanonicalType::Float | CanonicalType::Double
        )
    }

    /// Returns true for CHAR and VARCHAR.
    pub fn is_text(&self) -> bool {
        matches!(self, CanonicalType::Char | CanonicalType::Varchar)
    }

    /// Returns true for the date/time family.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            CanonicalType::Date
                | CanonicalType::Time
                | CanonicalType::Timestamp
                | CanonicalType::Timestamptz
        )
    }

    /// How values of this type travel in JSON, and which operators apply.
    pub fn capabilities(&self) -> ScalarCapabilities {
        let representation = match self {
            CanonicalType::Char | CanonicalType::Varchar | CanonicalType::Time => {
                Representation::String
            }
            CanonicalType::Integer => Representation::Int32,
            CanonicalType::Float => Representation::Float32,
            CanonicalType::Double => Representation::Float64,
            CanonicalType::Boolean => Representation::Boolean,
            CanonicalType::Binary | CanonicalType::Varbinary => Representation::Bytes,
            CanonicalType::Date => Representation::Date,
            CanonicalType::Timestamp => Representation::Timestamp,
            CanonicalType::Timestamptz => Representation::TimestampTz,
            CanonicalType::List | CanonicalType::Map => Representation::Json,
        };

        let comparison_operators: &'static [ComparisonOperator] = if self.is_numeric() {
            &ORDERED_OPERATORS
        } else if self.is_text() || self.is_temporal() {
            &TEXT_OPERATORS
        } else if *self == CanonicalType::Boolean {
            &[ComparisonOperator::Eq]
        } else {
            &[]
        };

        let aggregate_functions: &'static [AggregateFunction] = if self.is_numeric() {
            &NUMERIC_AGGREGATES
        } else {
            &[]
        };

        ScalarCapabilities {
            representation,
            comparison_operators,
            aggregate_functions,
            aggregate_result: self.is_numeric().then_some(CanonicalType::Double),
        }
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("not a canonical type: {}", s))
    }
}

/// JSON representation of a scalar type's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    String,
    Json,
    Int32,
    Float32,
    Float64,
    Boolean,
    Bytes,
    Date,
    Timestamp,
    TimestampTz,
}

/// Comparison operators a scalar type supports in predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    In,
    Gt,
    Lt,
    Gte,
    Lte,
    Like,
}

impl ComparisonOperator {
    /// Operator name as exposed to callers (`_eq`, `_like`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "_eq",
            ComparisonOperator::In => "_in",
            ComparisonOperator::Gt => "_gt",
            ComparisonOperator::Lt => "_lt",
            ComparisonOperator::Gte => "_gte",
            ComparisonOperator::Lte => "_lte",
            ComparisonOperator::Like => "_like",
        }
    }
}

/// Aggregate functions available on numeric types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Sum,
    Max,
    Avg,
    Min,
}

impl AggregateFunction {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Max => "max",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
        }
    }
}

const ORDERED_OPERATORS: [ComparisonOperator; 6] = [
    ComparisonOperator::Eq,
    ComparisonOperator::In,
    ComparisonOperator::Gt,
    ComparisonOperator::Lt,
    ComparisonOperator::Gte,
    ComparisonOperator::Lte,
];

const TEXT_OPERATORS: [ComparisonOperator; 7] = [
    ComparisonOperator::Eq,
    ComparisonOperator::In,
    ComparisonOperator::Gt,
    ComparisonOperator::Lt,
    ComparisonOperator::Gte,
    ComparisonOperator::Lte,
    ComparisonOperator::Like,
];

const NUMERIC_AGGREGATES: [AggregateFunction; 4] = [
    AggregateFunction::Sum,
    AggregateFunction::Max,
    AggregateFunction::Avg,
    AggregateFunction::Min,
];

/// Representation and operator support of one canonical type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarCapabilities {
    pub representation: Representation,
    pub comparison_operators: &'static [ComparisonOperator],
    pub aggregate_functions: &'static [AggregateFunction],
    /// Type of every aggregate result (nullable), when aggregates exist.
    pub aggregate_result: Option<CanonicalType>,
}
