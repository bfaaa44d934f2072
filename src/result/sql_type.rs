//! JDBC type codes and the dispatch classes the materializer uses.

/// `java.sql.Types` codes reported in result-set metadata.
pub mod type_codes {
    pub const BIT: i32 = -7;
    pub const TINYINT: i32 = -6;
    pub const SMALLINT: i32 = 5;
    pub const INTEGER: i32 = 4;
    pub const BIGINT: i32 = -5;
    pub const FLOAT: i32 = 6;
    pub const REAL: i32 = 7;
    pub const DOUBLE: i32 = 8;
    pub const NUMERIC: i32 = 2;
    pub const DECIMAL: i32 = 3;
    pub const CHAR: i32 = 1;
    pub const VARCHAR: i32 = 12;
    pub const LONGVARCHAR: i32 = -1;
    pub const NCHAR: i32 = -15;
    pub const NVARCHAR: i32 = -9;
    pub const LONGNVARCHAR: i32 = -16;
    pub const BINARY: i32 = -2;
    pub const VARBINARY: i32 = -3;
    pub const LONGVARBINARY: i32 = -4;
    pub const DATE: i32 = 91;
    pub const TIME: i32 = 92;
    pub const TIMESTAMP: i32 = 93;
    pub const TIME_WITH_TIMEZONE: i32 = 2013;
    pub const TIMESTAMP_WITH_TIMEZONE: i32 = 2014;
    pub const BOOLEAN: i32 = 16;
    pub const NULL: i32 = 0;
    pub const OTHER: i32 = 1111;
    pub const JAVA_OBJECT: i32 = 2000;
    pub const STRUCT: i32 = 2002;
    pub const ARRAY: i32 = 2003;
}

/// How a column's cells are rendered to JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlTypeClass {
    /// String form (character, binary and DECIMAL columns).
    Text,
    /// JSON integer.
    Integer,
    Boolean,
    /// Single-precision number.
    Float,
    /// Double-precision number (DOUBLE, NUMERIC).
    Double,
    /// Date/time string form.
    Temporal,
    /// Rendered by the runtime shape of each value.
    Other,
}

impl SqlTypeClass {
    pub fn from_type_code(code: i32) -> Self {
        use type_codes::*;
        match code {
            CHAR | VARCHAR | LONGVARCHAR | NCHAR | NVARCHAR | LONGNVARCHAR | BINARY
            | VARBINARY | LONGVARBINARY | DECIMAL => SqlTypeClass::Text,
            BIGINT | INTEGER | SMALLINT | TINYINT | BIT => SqlTypeClass::Integer,
            BOOLEAN => SqlTypeClass::Boolean,
            REAL | FLOAT => SqlTypeClass::Float,
            NUMERIC | DOUBLE => SqlTypeClass::Double,
            DATE | TIME | TIMESTAMP | TIME_WITH_TIMEZONE | TIMESTAMP_WITH_TIMEZONE => {
                SqlTypeClass::Temporal
            }
            _ => SqlTypeClass::Other,
        }
    }
}

/// Best-effort JDBC type code for a declared column type name.
///
/// Used by sources that only know type names (SQLite declared types, worker
/// columns without a code).
pub fn type_code_for_name(type_name: &str) -> i32 {
    use type_codes::*;
    let upper = type_name.trim().to_uppercase();
    let base = upper.split('(').next().unwrap_or("").trim();
    match base {
        "" => OTHER,
        "BOOLEAN" | "BOOL" => BOOLEAN,
        "BIT" => BIT,
        "TINYINT" => TINYINT,
        "SMALLINT" => SMALLINT,
        "BIGINT" => BIGINT,
        "REAL" => REAL,
        "FLOAT" => FLOAT,
        "DOUBLE" | "DOUBLE PRECISION" => DOUBLE,
        "NUMERIC" => NUMERIC,
        "DECIMAL" => DECIMAL,
        "CHAR" | "CHARACTER" => CHAR,
        "NCHAR" => NCHAR,
        "NVARCHAR" => NVARCHAR,
        "BINARY" => BINARY,
        "VARBINARY" => VARBINARY,
        "BLOB" => LONGVARBINARY,
        "DATE" => DATE,
        "TIME" => TIME,
        "TIMESTAMP" | "DATETIME" => TIMESTAMP,
        "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => TIMESTAMP_WITH_TIMEZONE,
        _ if base.contains("INT") => INTEGER,
        _ if base.contains("CHAR") || base.contains("CLOB") || base.contains("TEXT") => VARCHAR,
        _ => OTHER,
    }
}
