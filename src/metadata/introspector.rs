//! SchemaIntrospector trait definition.
//!
//! The introspector is the JDBC-style metadata surface of a connection:
//! catalogs, schemas, table types, tables, keys and columns. Backends report
//! raw rows; the collector turns them into a [`SchemaSnapshot`].
//!
//! [`SchemaSnapshot`]: super::SchemaSnapshot

use async_trait::async_trait;

use super::types::{ColumnEntry, ExportedKey, PrimaryKeyEntry, TableEntry};
use crate::error::SourceResult;

/// Metadata calls a source answers.
///
/// Calls are issued sequentially by the collector; implementations need not
/// support concurrent use of one connection.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Catalog names. Sources without catalogs report a single `""`.
    async fn catalogs(&self) -> SourceResult<Vec<String>>;

    /// Schema names within a catalog.
    async fn schemas(&self, catalog: &str) -> SourceResult<Vec<String>>;

    /// Table types the source knows about ("TABLE", "VIEW", ...).
    async fn table_types(&self) -> SourceResult<Vec<String>>;

    /// Tables of a schema whose type is one of `types`.
    async fn tables(
        &self,
        catalog: &str,
        schema: &str,
        types: &[String],
    ) -> SourceResult<Vec<TableEntry>>;

    /// Primary-key columns of a table, in any order.
    async fn primary_keys(
        &self,
        catalog: &str,
        schema: &str,
        table: &str,
    ) -> SourceResult<Vec<PrimaryKeyEntry>>;

    /// Foreign keys in other tables that reference this table.
    async fn exported_keys(
        &self,
        catalog: &str,
        schema: &str,
        table: &str,
    ) -> SourceResult<Vec<ExportedKey>>;

    /// Columns of a table, in ordinal order.
    async fn columns(
        &self,
        catalog: &str,
        schema: &str,
        table: &str,
    ) -> SourceResult<Vec<ColumnEntry>>;
}
