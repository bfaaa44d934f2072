//! Error types shared across the connector core.
//!
//! Each concern gets its own enum so callers can tell a fatal connection or
//! snapshot failure apart from a per-query fault that degrades to an
//! `{"error": ...}` payload.

use thiserror::Error;

use crate::worker::WorkerError;

/// Result type for calls into a source backend.
pub type SourceResult<T> = Result<T, SourceError>;

/// A failure reported by the underlying data source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// SQLite reported an error.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The engine worker reported an error.
    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// The source does not implement this metadata or execution call.
    #[error("not supported by this source: {0}")]
    Unsupported(String),

    /// Any other source-side failure.
    #[error("{0}")]
    Other(String),
}

impl SourceError {
    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported(what.into())
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Errors raised while establishing a connection.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The driver (database file, worker binary) could not be located.
    #[error("driver not found: {0}")]
    DriverNotFound(String),

    /// The descriptor does not describe a usable source.
    #[error("invalid model descriptor: {0}")]
    InvalidDescriptor(String),

    /// The driver was found but the handshake failed.
    #[error("handshake with '{target}' failed: {source}")]
    Handshake {
        target: String,
        #[source]
        source: SourceError,
    },
}

/// Errors that abort a whole schema snapshot build.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("failed to enumerate catalogs: {0}")]
    Catalogs(#[source] SourceError),

    #[error("failed to enumerate schemas of catalog '{catalog}': {source}")]
    Schemas {
        catalog: String,
        #[source]
        source: SourceError,
    },

    #[error("failed to enumerate table types: {0}")]
    TableTypes(#[source] SourceError),

    #[error("failed to resolve schema '{schema}': {source}")]
    SubSchema {
        schema: String,
        #[source]
        source: SourceError,
    },

    #[error("failed to enumerate tables of '{catalog}.{schema}': {source}")]
    Tables {
        catalog: String,
        schema: String,
        #[source]
        source: SourceError,
    },

    #[error("failed to read columns of '{schema}.{table}': {source}")]
    Columns {
        schema: String,
        table: String,
        #[source]
        source: SourceError,
    },
}

/// Malformed sentinel markup in caller query text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplaterError {
    /// A sentinel opened a literal that is never closed.
    #[error("unbalanced literal marker '{marker}' at byte offset {offset}")]
    UnbalancedMarker { marker: String, offset: usize },

    /// A raw bind marker appears outside any literal or quoted string.
    #[error("stray bind marker '?' at byte offset {offset}; string values must be sentinel-wrapped")]
    StrayBindMarker { offset: usize },
}

/// Any fault between templating and the last serialized row.
#[derive(Error, Debug)]
pub enum QueryExecutionError {
    #[error(transparent)]
    Template(#[from] TemplaterError),

    #[error("failed to prepare statement: {0}")]
    Prepare(#[source] SourceError),

    #[error("statement expects {expected} parameters but {bound} values were bound")]
    ParameterCount { expected: usize, bound: usize },

    #[error("failed to execute statement: {0}")]
    Execute(#[source] SourceError),

    #[error("failed to serialize column '{column}': {message}")]
    Serialize { column: String, message: String },
}

impl QueryExecutionError {
    pub fn serialize(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialize {
            column: column.into(),
            message: message.into(),
        }
    }
}

/// Build the `{"error": "<message>"}` envelope used for every degraded output.
pub fn error_envelope(err: &dyn std::fmt::Display) -> serde_json::Value {
    serde_json::json!({ "error": err.to_string() })
}
