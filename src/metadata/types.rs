//! Metadata types.
//!
//! Two families live here: the raw rows a [`SchemaIntrospector`] reports
//! (`TableEntry`, `ColumnEntry`, `PrimaryKeyEntry`, [`ExportedKey`]) and the
//! collected, normalized model ([`TableMetadata`], [`ColumnMetadata`],
//! [`SchemaSnapshot`]).
//!
//! [`SchemaIntrospector`]: super::SchemaIntrospector

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::types::CanonicalType;

// ============================================================================
// Introspection rows
// ============================================================================

/// One row of a table listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    #[serde(default)]
    pub catalog: String,
    #[serde(default)]
    pub schema: String,
    pub name: String,
    /// Source-reported table type ("TABLE", "VIEW", ...).
    #[serde(rename = "type", default)]
    pub table_type: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// One column of a table, as reported by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub name: String,
    /// Vendor type name, fed to the type normalizer.
    pub type_name: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub remarks: Option<String>,
}

fn default_nullable() -> bool {
    true
}

/// One primary-key column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyEntry {
    pub column_name: String,
    /// 1-based position within the key.
    pub key_seq: i32,
    #[serde(default)]
    pub pk_name: Option<String>,
}

/// A foreign key referencing a column of this table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedKey {
    pub pk_table_catalog: Option<String>,
    pub pk_table_schema: Option<String>,
    pub pk_table_name: String,
    pub pk_column_name: String,
    pub pk_name: Option<String>,
    pub fk_table_catalog: Option<String>,
    pub fk_table_schema: Option<String>,
    pub fk_table_name: String,
    pub fk_column_name: String,
    pub fk_name: Option<String>,
}

// ============================================================================
// Collected model
// ============================================================================

/// A normalized column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    pub name: String,
    pub scalar_type: CanonicalType,
    pub nullable: bool,
    pub description: Option<String>,
}

/// Which key lookup failed for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    PrimaryKeys,
    ExportedKeys,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::PrimaryKeys => f.write_str("primary key"),
            KeyKind::ExportedKeys => f.write_str("exported key"),
        }
    }
}

/// A recovered key lookup failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} lookup failed: {message}")]
pub struct KeyLookupFailure {
    pub kind: KeyKind,
    pub message: String,
}

/// Whether a table's key lists are complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeyLookup {
    #[default]
    Complete,
    /// At least one lookup failed; the affected list is empty.
    Partial { failures: Vec<KeyLookupFailure> },
}

impl KeyLookup {
    pub fn is_complete(&self) -> bool {
        matches!(self, KeyLookup::Complete)
    }

    pub fn failures(&self) -> &[KeyLookupFailure] {
        match self {
            KeyLookup::Complete => &[],
            KeyLookup::Partial { failures } => failures,
        }
    }

    pub(crate) fn record(&mut self, failure: KeyLookupFailure) {
        match self {
            KeyLookup::Complete => {
                *self = KeyLookup::Partial {
                    failures: vec![failure],
                }
            }
            KeyLookup::Partial { failures } => failures.push(failure),
        }
    }
}

/// A collected table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    pub catalog: String,
    pub schema: String,
    pub name: String,
    pub physical_catalog: String,
    pub physical_schema: String,
    pub description: Option<String>,
    /// Primary-key column names, in key order.
    pub primary_keys: Vec<String>,
    pub exported_keys: Vec<ExportedKey>,
    pub columns: BTreeMap<String, ColumnMetadata>,
    #[serde(skip)]
    pub key_lookup: KeyLookup,
}

impl TableMetadata {
    /// Logical identity: (catalog, schema, name).
    pub fn identity(&self) -> (&str, &str, &str) {
        (&self.catalog, &self.schema, &self.name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.get(name)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, self.name)
    }
}

/// All tables of one connection lifetime.
///
/// Immutable once built; identities are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSnapshot {
    tables: Vec<TableMetadata>,
}

impl SchemaSnapshot {
    /// Build a snapshot, dropping later tables whose identity repeats.
    pub fn new(tables: Vec<TableMetadata>) -> Self {
        let mut seen = HashSet::new();
        let tables = tables
            .into_iter()
            .filter(|t| seen.insert((t.catalog.clone(), t.schema.clone(), t.name.clone())))
            .collect();
        Self { tables }
    }

    pub fn tables(&self) -> &[TableMetadata] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn get(&self, catalog: &str, schema: &str, name: &str) -> Option<&TableMetadata> {
        self.tables
            .iter()
            .find(|t| t.identity() == (catalog, schema, name))
    }

    /// First table with the given name, in collection order.
    pub fn find(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Tables whose key lookups were incomplete.
    pub fn partial_tables(&self) -> impl Iterator<Item = &TableMetadata> {
        self.tables.iter().filter(|t| !t.key_lookup.is_complete())
    }

    /// Map of table key → table, as consumed by the protocol layer.
    ///
    /// Tables are keyed by name. A later table whose name is taken is keyed
    /// `schema.name`, and `catalog.schema.name` if that is taken too. Dotted
    /// table names can still collide; those get a `#n` suffix.
    pub fn to_json(&self) -> serde_json::Value {
        let mut keyed: BTreeMap<String, &TableMetadata> = BTreeMap::new();
        for table in &self.tables {
            let candidates = [
                table.name.clone(),
                format!("{}.{}", table.schema, table.name),
                table.qualified_name(),
            ];
            let key = match candidates.into_iter().find(|k| !keyed.contains_key(k)) {
                Some(key) => key,
                None => {
                    let qualified = table.qualified_name();
                    let key = (2..)
                        .map(|n| format!("{}#{}", qualified, n))
                        .find(|k| !keyed.contains_key(k))
                        .unwrap_or(qualified);
                    warn!(table = %table.qualified_name(), %key, "table key collides, using suffixed key");
                    key
                }
            };
            keyed.insert(key, table);
        }
        serde_json::to_value(keyed).unwrap_or(serde_json::Value::Null)
    }
}
