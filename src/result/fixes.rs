//! Post-processing of structured rows.
//!
//! Some sources return the text `"null"` for missing values, omit fields the
//! caller asked for, or carry the synthetic `CONSTANT` column the query
//! composer adds to otherwise empty projections.

use serde_json::{Map, Value};

/// Name of the synthetic projection column.
pub const CONSTANT_COLUMN: &str = "CONSTANT";

/// Row fixes applied to structured results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFixes {
    /// Field names the caller expects in every row.
    pub expected_fields: Vec<String>,
}

impl RowFixes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expected_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            expected_fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Fix every object row of a materialized array in place.
    ///
    /// Anything other than an array of objects (JSON-mode output, error
    /// envelopes) is left untouched.
    pub fn apply(&self, rows: &mut Value) {
        if let Value::Array(items) = rows {
            for item in items.iter_mut() {
                if let Value::Object(row) = item {
                    self.fix_row(row);
                }
            }
        }
    }

    fn fix_row(&self, row: &mut Map<String, Value>) {
        if self.expected_fields.len() > row.len() {
            for field in &self.expected_fields {
                if !row.contains_key(field) {
                    row.insert(field.clone(), Value::Null);
                }
            }
        }
        for value in row.values_mut() {
            if value.as_str() == Some("null") {
                *value = Value::Null;
            }
        }
        row.remove(CONSTANT_COLUMN);
    }
}
