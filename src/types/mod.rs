//! Canonical scalar types and vendor type normalization.

mod canonical;
mod normalize;

pub use canonical::{
    AggregateFunction, CanonicalType, ComparisonOperator, Representation, ScalarCapabilities,
};
pub use normalize::{
    known_type, normalize, Normalized, SourceDialect, SqliteDateTextOverride, TypeContext,
    UnknownTypeDiagnostic,
};
