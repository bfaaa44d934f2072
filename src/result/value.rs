//! Backend-neutral result rows.
//!
//! Backends translate their native cells into [`SqlValue`]s and describe each
//! column with its JDBC type code, so one materializer serves every source.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::sql_type::SqlTypeClass;

/// A single result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<SqlValue>),
    Map(Vec<(String, SqlValue)>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Build a value from untyped JSON, as returned by the engine worker.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => SqlValue::Null,
            serde_json::Value::Bool(b) => SqlValue::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Integer(i),
                None => SqlValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => SqlValue::Text(s),
            serde_json::Value::Array(items) => {
                SqlValue::List(items.into_iter().map(SqlValue::from_json).collect())
            }
            serde_json::Value::Object(map) => SqlValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, SqlValue::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// String form of a value; bytes render as lowercase hex.
impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("null"),
            SqlValue::Boolean(b) => write!(f, "{}", b),
            SqlValue::Integer(i) => write!(f, "{}", i),
            SqlValue::Double(d) => write!(f, "{}", d),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Bytes(bytes) => {
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            SqlValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            SqlValue::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Description of one result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultColumn {
    /// Column label (alias if present).
    pub label: String,
    /// JDBC type code (`java.sql.Types`).
    pub type_code: i32,
    /// Source-specific type name, informational only.
    #[serde(default)]
    pub type_name: String,
}

impl ResultColumn {
    pub fn new(label: impl Into<String>, type_code: i32, type_name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            type_code,
            type_name: type_name.into(),
        }
    }

    pub fn type_class(&self) -> SqlTypeClass {
        SqlTypeClass::from_type_code(self.type_code)
    }
}

/// A fully fetched result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl ResultSet {
    pub fn new(columns: Vec<ResultColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<SqlValue>) {
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}
