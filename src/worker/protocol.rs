//! Protocol types for worker communication.
//!
//! Every request is one NDJSON line `{id, method, params}`; every response is
//! one line `{id, success, result | error}`. Metadata methods mirror the
//! JDBC `DatabaseMetaData` calls the collector needs. Requests aimed at a
//! federated sub-connection carry its `sub_schema` name.

use serde::{Deserialize, Serialize};

use crate::metadata::{ColumnEntry, ExportedKey, PrimaryKeyEntry, TableEntry};
use crate::result::ResultColumn;

// ============================================================================
// Request/Response Envelope
// ============================================================================

/// Request envelope sent to the worker.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    /// Unique request ID for correlation.
    pub id: String,
    /// Method name (e.g., "metadata.list_schemas").
    pub method: String,
    /// Method-specific parameters.
    pub params: serde_json::Value,
}

/// Response envelope received from the worker.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    /// Request ID this response corresponds to.
    pub id: String,
    /// Whether the request succeeded.
    pub success: bool,
    /// Result data (present if success = true).
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Error information (present if success = false).
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

/// Error information in a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

// ============================================================================
// Request Parameters
// ============================================================================

/// Model the worker serves; included in every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Model path or connection URL.
    pub model: String,
    /// Federated sub-connection to answer from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_schema: Option<String>,
}

/// Parameters for `connection.open` and catalog/table-type listings.
#[derive(Debug, Clone, Serialize)]
pub struct ModelParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
}

/// Parameters for `metadata.list_schemas`.
#[derive(Debug, Clone, Serialize)]
pub struct ListSchemasParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    pub catalog: String,
}

/// Parameters for `metadata.list_tables`.
#[derive(Debug, Clone, Serialize)]
pub struct ListTablesParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    pub catalog: String,
    pub schema: String,
    /// Table types to include.
    pub types: Vec<String>,
}

/// Parameters for per-table calls: keys and columns.
#[derive(Debug, Clone, Serialize)]
pub struct TableParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    pub catalog: String,
    pub schema: String,
    pub table: String,
}

/// Parameters for `metadata.get_sub_schema`.
#[derive(Debug, Clone, Serialize)]
pub struct SubSchemaParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    pub name: String,
}

/// Parameters for `metadata.get_table_location`.
#[derive(Debug, Clone, Serialize)]
pub struct TableLocationParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    pub table: String,
}

/// Parameters for `query.prepare`.
#[derive(Debug, Clone, Serialize)]
pub struct PrepareParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    pub sql: String,
}

/// Parameters for `query.execute`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    pub sql: String,
    /// Positional string binds.
    pub args: Vec<String>,
}

// ============================================================================
// Response Types
// ============================================================================

/// Response from `connection.open`.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenResponse {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub product_version: Option<String>,
}

/// Response from `metadata.list_catalogs`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListCatalogsResponse {
    pub catalogs: Vec<String>,
}

/// Response from `metadata.list_schemas`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListSchemasResponse {
    pub schemas: Vec<String>,
}

/// Response from `metadata.list_table_types`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListTableTypesResponse {
    pub table_types: Vec<String>,
}

/// Response from `metadata.list_tables`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListTablesResponse {
    pub tables: Vec<TableEntry>,
}

/// Response from `metadata.get_primary_keys`.
#[derive(Debug, Clone, Deserialize)]
pub struct PrimaryKeysResponse {
    pub primary_keys: Vec<PrimaryKeyEntry>,
}

/// Response from `metadata.get_exported_keys`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportedKeysResponse {
    pub exported_keys: Vec<ExportedKey>,
}

/// Response from `metadata.get_columns`.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnsResponse {
    pub columns: Vec<ColumnEntry>,
}

/// Response from `metadata.get_sub_schema`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubSchemaResponse {
    pub name: String,
    /// Dialect of the wrapped source ("sqlite", "postgresql", ...), if any.
    #[serde(default)]
    pub dialect: Option<String>,
    /// Whether the schema wraps its own JDBC connection.
    #[serde(default)]
    pub federated: bool,
}

/// Response from `metadata.get_table_location`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableLocationResponse {
    #[serde(default)]
    pub catalog: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
}

/// Response from `query.prepare`.
#[derive(Debug, Clone, Deserialize)]
pub struct PrepareResponse {
    pub parameter_count: usize,
}

/// Response from `query.execute`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteResponse {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

// ============================================================================
// Method Names
// ============================================================================

/// Worker method names.
pub mod methods {
    pub const OPEN: &str = "connection.open";
    pub const LIST_CATALOGS: &str = "metadata.list_catalogs";
    pub const LIST_SCHEMAS: &str = "metadata.list_schemas";
    pub const LIST_TABLE_TYPES: &str = "metadata.list_table_types";
    pub const LIST_TABLES: &str = "metadata.list_tables";
    pub const GET_PRIMARY_KEYS: &str = "metadata.get_primary_keys";
    pub const GET_EXPORTED_KEYS: &str = "metadata.get_exported_keys";
    pub const GET_COLUMNS: &str = "metadata.get_columns";
    pub const GET_SUB_SCHEMA: &str = "metadata.get_sub_schema";
    pub const GET_TABLE_LOCATION: &str = "metadata.get_table_location";
    pub const PREPARE: &str = "query.prepare";
    pub const EXECUTE: &str = "query.execute";
}
