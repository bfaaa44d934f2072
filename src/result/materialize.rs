//! Result set → canonical JSON.

use serde_json::{Map, Number, Value};

use super::sql_type::SqlTypeClass;
use super::value::{ResultSet, SqlValue};
use crate::error::{error_envelope, QueryExecutionError};

const JSON_OBJECT_PREFIX: &str = "select json_object(";

/// Whether the query produces pre-rendered JSON in its first column.
pub fn is_json_object_query(query: &str) -> bool {
    query.trim().to_lowercase().starts_with(JSON_OBJECT_PREFIX)
}

/// Render a result set. Never fails: faults become `{"error": ...}`.
pub fn materialize(result: &ResultSet, query: &str) -> Value {
    match try_materialize(result, query) {
        Ok(value) => value,
        Err(e) => error_envelope(&e),
    }
}

/// Render a result set, reporting the first cell that cannot be converted.
///
/// Single-JSON-column queries yield an array of each row's first column as a
/// string; everything else yields an array of objects keyed by column label.
pub fn try_materialize(result: &ResultSet, query: &str) -> Result<Value, QueryExecutionError> {
    if is_json_object_query(query) {
        let rows = result
            .rows
            .iter()
            .map(|row| match row.first() {
                None | Some(SqlValue::Null) => Value::Null,
                Some(v) => Value::String(v.to_string()),
            })
            .collect();
        return Ok(Value::Array(rows));
    }

    let mut rows = Vec::with_capacity(result.rows.len());
    for row in &result.rows {
        let mut object = Map::new();
        for (column, cell) in result.columns.iter().zip(row.iter()) {
            let value = render_cell(cell, column.type_class())
                .map_err(|message| QueryExecutionError::serialize(&column.label, message))?;
            object.insert(column.label.clone(), value);
        }
        rows.push(Value::Object(object));
    }
    Ok(Value::Array(rows))
}

/// Flatten an explain-plan result into one object.
///
/// Cell (1, 1) is keyed by the query text; every other cell by
/// `"{query}.{row}.{col}"`, both indices 1-based.
pub fn materialize_explain(result: &ResultSet, query: &str) -> Value {
    let mut plan = Map::new();
    for (r, row) in result.rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let key = if r == 0 && c == 0 {
                query.to_string()
            } else {
                format!("{}.{}.{}", query, r + 1, c + 1)
            };
            let value = match cell {
                SqlValue::Null => Value::Null,
                other => Value::String(other.to_string()),
            };
            plan.insert(key, value);
        }
    }
    Value::Object(plan)
}

fn render_cell(value: &SqlValue, class: SqlTypeClass) -> Result<Value, String> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match class {
        SqlTypeClass::Text | SqlTypeClass::Temporal => Ok(Value::String(value.to_string())),
        SqlTypeClass::Integer => as_integer(value).map(|i| Value::Number(i.into())),
        SqlTypeClass::Boolean => as_boolean(value).map(Value::Bool),
        SqlTypeClass::Float => as_double(value).map(|d| float_value(d as f32)),
        SqlTypeClass::Double => as_double(value).map(double_value),
        SqlTypeClass::Other => Ok(shape(value)),
    }
}

/// Dispatch on the runtime shape of a value: lists and maps nest, everything
/// else renders as its string form.
fn shape(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::List(items) => Value::Array(items.iter().map(nested).collect()),
        SqlValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), nested(v)))
                .collect(),
        ),
        other => Value::String(other.to_string()),
    }
}

/// Values inside a list or map keep their natural JSON type.
fn nested(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Boolean(b) => Value::Bool(*b),
        SqlValue::Integer(i) => Value::Number((*i).into()),
        SqlValue::Double(d) => double_value(*d),
        SqlValue::Text(s) => Value::String(s.clone()),
        SqlValue::Bytes(_) => Value::String(value.to_string()),
        SqlValue::List(_) | SqlValue::Map(_) => shape(value),
    }
}

fn as_integer(value: &SqlValue) -> Result<i64, String> {
    match value {
        SqlValue::Integer(i) => Ok(*i),
        SqlValue::Boolean(b) => Ok(i64::from(*b)),
        SqlValue::Double(d) if d.is_finite() => Ok(d.trunc() as i64),
        SqlValue::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("'{}' is not an integer", s)),
        other => Err(format!("cannot read {} as an integer", other)),
    }
}

fn as_boolean(value: &SqlValue) -> Result<bool, String> {
    match value {
        SqlValue::Boolean(b) => Ok(*b),
        SqlValue::Integer(i) => Ok(*i != 0),
        SqlValue::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(format!("'{}' is not a boolean", s)),
        },
        other => Err(format!("cannot read {} as a boolean", other)),
    }
}

fn as_double(value: &SqlValue) -> Result<f64, String> {
    match value {
        SqlValue::Double(d) => Ok(*d),
        SqlValue::Integer(i) => Ok(*i as f64),
        SqlValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", s)),
        other => Err(format!("cannot read {} as a number", other)),
    }
}

/// Widen through the shortest decimal form so 1.1f32 renders as 1.1.
fn float_value(f: f32) -> Value {
    match f.to_string().parse::<f64>() {
        Ok(d) => double_value(d),
        Err(_) => Value::Null,
    }
}

fn double_value(d: f64) -> Value {
    Number::from_f64(d).map(Value::Number).unwrap_or(Value::Null)
}
