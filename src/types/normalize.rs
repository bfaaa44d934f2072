//! Vendor type name → canonical type normalization.
//!
//! Resolution order:
//! 1. exact, case-sensitive match against the known spellings table
//! 2. case-insensitive substring heuristics
//! 3. VARCHAR, with an [`UnknownTypeDiagnostic`]
//!
//! followed by the [`SqliteDateTextOverride`] rule. Nullability is tracked on
//! the column, never in the type: `NOT NULL` spellings collapse onto the type
//! of their nullable form.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use super::canonical::CanonicalType;

/// Dialect of the source a schema's tables live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceDialect {
    #[default]
    Generic,
    /// SQLite reached through the federating engine.
    Sqlite,
}

impl SourceDialect {
    /// Dialect for a product or dialect name reported by a source.
    pub fn from_name(name: &str) -> Self {
        if name.to_lowercase().contains("sqlite") {
            SourceDialect::Sqlite
        } else {
            SourceDialect::Generic
        }
    }
}

/// Context for one normalization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeContext<'a> {
    pub dialect: SourceDialect,
    pub table: &'a str,
    pub column: &'a str,
}

impl<'a> TypeContext<'a> {
    pub fn new(dialect: SourceDialect, table: &'a str, column: &'a str) -> Self {
        Self {
            dialect,
            table,
            column,
        }
    }

    /// Context with no dialect and no table/column names.
    pub fn bare() -> TypeContext<'static> {
        TypeContext {
            dialect: SourceDialect::Generic,
            table: "",
            column: "",
        }
    }
}

/// Non-fatal record of a type name nothing recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTypeDiagnostic {
    pub type_name: String,
    pub table: String,
    pub column: String,
}

impl fmt::Display for UnknownTypeDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown column type '{}' for {}.{}, using VARCHAR",
            self.type_name, self.table, self.column
        )
    }
}

/// Result of normalizing one vendor type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub scalar_type: CanonicalType,
    pub diagnostic: Option<UnknownTypeDiagnostic>,
}

/// Legacy override: the federating engine reports every SQLite text column
/// as `VARCHAR(65536)`, so SQLite columns whose name mentions "date" are
/// treated as timestamps. Column-name sniffing; deliberately narrow.
pub struct SqliteDateTextOverride;

impl SqliteDateTextOverride {
    const TYPE_PREFIX: &'static str = "VARCHAR(65536)";

    pub fn applies(vendor_type: &str, ctx: &TypeContext<'_>) -> bool {
        ctx.dialect == SourceDialect::Sqlite
            && vendor_type.starts_with(Self::TYPE_PREFIX)
            && ctx.column.to_lowercase().contains("date")
    }
}

static KNOWN_TYPES: Lazy<HashMap<&'static str, CanonicalType>> = Lazy::new(|| {
    use CanonicalType::*;
    HashMap::from([
        ("CHAR", Char),
        ("VARCHAR", Varchar),
        ("VARCHAR(65536)", Varchar),
        ("VARCHAR(65536) NOT NULL", Varchar),
        ("VARCHAR NOT NULL", Varchar),
        ("JavaType(class java.util.ArrayList)", List),
        ("JavaType(class org.apache.calcite.adapter.file.ComparableArrayList)", List),
        ("ANY ARRAY", List),
        ("JavaType(class java.util.LinkedHashMap)", Map),
        ("JavaType(class org.apache.calcite.adapter.file.ComparableLinkedHashMap)", Map),
        ("JavaType(class java.lang.String)", Varchar),
        ("JavaType(class java.lang.Integer)", Integer),
        ("INTEGER NOT NULL", Integer),
        ("INTEGER", Integer),
        ("SMALLINT NOT NULL", Integer),
        ("SMALLINT", Integer),
        ("TINYINT NOT NULL", Integer),
        ("TINYINT", Integer),
        ("BIGINT NOT NULL", Integer),
        ("BIGINT", Integer),
        ("FLOAT NOT NULL", Float),
        ("FLOAT", Float),
        ("DOUBLE NOT NULL", Double),
        ("DOUBLE", Double),
        ("BOOLEAN NOT NULL", Boolean),
        ("BOOLEAN", Boolean),
        ("VARBINARY NOT NULL", Varbinary),
        ("VARBINARY", Varbinary),
        ("BINARY NOT NULL", Binary),
        ("BINARY", Binary),
        ("DATE NOT NULL", Date),
        ("DATE", Date),
        ("TIME(0) NOT NULL", Time),
        ("TIME(0)", Time),
        ("TIMESTAMP(0) NOT NULL", Timestamp),
        ("TIMESTAMP(0)", Timestamp),
        ("TIMESTAMP(3) NOT NULL", Timestamp),
        ("TIMESTAMP(3)", Timestamp),
        ("TIMESTAMP NOT NULL", Timestamptz),
        ("TIMESTAMP", Timestamptz),
        ("DECIMAL(10,2)", Float),
        ("DECIMAL(12,2)", Float),
    ])
});

/// Look up a spelling in the exact-match table.
pub fn known_type(vendor_type: &str) -> Option<CanonicalType> {
    KNOWN_TYPES.get(vendor_type).copied()
}

/// Normalize a vendor type name.
///
/// Pure: identical inputs always produce identical outputs.
///
/// # Examples
///
/// ```
/// use relbridge::types::{normalize, CanonicalType, TypeContext};
///
/// let ctx = TypeContext::bare();
/// assert_eq!(normalize("DECIMAL(10,2)", &ctx).scalar_type, CanonicalType::Float);
/// assert_eq!(normalize("INTEGER NOT NULL", &ctx).scalar_type, CanonicalType::Integer);
/// ```
pub fn normalize(vendor_type: &str, ctx: &TypeContext<'_>) -> Normalized {
    let mut diagnostic = None;

    let mut scalar_type = match known_type(vendor_type) {
        Some(t) => t,
        None => match heuristic(vendor_type) {
            Some(t) => t,
            None => {
                diagnostic = Some(UnknownTypeDiagnostic {
                    type_name: vendor_type.to_string(),
                    table: ctx.table.to_string(),
                    column: ctx.column.to_string(),
                });
                CanonicalType::Varchar
            }
        },
    };

    if SqliteDateTextOverride::applies(vendor_type, ctx) {
        scalar_type = CanonicalType::Timestamp;
    }

    Normalized {
        scalar_type,
        diagnostic,
    }
}

fn heuristic(vendor_type: &str) -> Option<CanonicalType> {
    let lower = vendor_type.to_lowercase();
    if lower.contains("varchar") {
        Some(CanonicalType::Varchar)
    } else if lower.contains("timestamp") {
        Some(CanonicalType::Timestamp)
    } else if lower.contains("decimal") {
        // Precision is dropped on purpose.
        Some(CanonicalType::Float)
    } else if lower.starts_with("any") {
        Some(CanonicalType::Varbinary)
    } else {
        None
    }
}
