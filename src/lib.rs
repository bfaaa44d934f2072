//! # relbridge
//!
//! Connector core that lets a semantic-modeling service treat any relational
//! source as a uniform queryable model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │           ModelDescriptor (config / CLI flags)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [ConnectionManager]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Connection (SQLite in-process / worker)          │
//! └─────────────────────────────────────────────────────────┘
//!              │                             │
//!              ▼ [metadata::collect]         ▼ [statement]
//! ┌──────────────────────────┐  ┌──────────────────────────┐
//! │ SchemaSnapshot           │  │ template → prepare       │
//! │ tables, keys, columns    │  │        → execute         │
//! │ (types::normalize)       │  │        → result          │
//! └──────────────────────────┘  └──────────────────────────┘
//!              │                             │
//!              ▼                             ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                 JSON for the query composer             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! [`connection::Session`] ties it together: one open model, a lazily
//! collected snapshot, and the query and explain pipelines.

pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod observe;
pub mod query;
pub mod result;
pub mod statement;
pub mod types;
pub mod worker;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{Driver, ModelDescriptor, Settings};
    pub use crate::connection::{Connection, ConnectionManager, SchemaHandle, Session};
    pub use crate::error::{
        ConnectionError, MetadataError, QueryExecutionError, SourceError, TemplaterError,
    };
    pub use crate::metadata::{ColumnMetadata, SchemaSnapshot, TableMetadata};
    pub use crate::observe::{ExecContext, TraceSink};
    pub use crate::result::{ResultSet, SqlValue};
    pub use crate::statement::{BoundStatement, StatementTemplater};
    pub use crate::types::{normalize, CanonicalType, SourceDialect, TypeContext};
}

pub use connection::{ConnectionManager, Session};
pub use metadata::SchemaSnapshot;
pub use observe::ExecContext;
