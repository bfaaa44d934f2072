//! Connection management.
//!
//! A [`Connection`] bundles the three capabilities the core needs from a live
//! source: JDBC-style metadata ([`SchemaIntrospector`]), per-schema handles
//! telling the collector about dialects and federation ([`SchemaHandle`]),
//! and statement execution.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Session                           │
//! │   descriptor ─▶ ConnectionManager::open ─▶ Connection    │
//! │   lazily built SchemaSnapshot (refresh / reconnect)      │
//! └──────────────────────────────────────────────────────────┘
//!            │                                │
//!            ▼                                ▼
//! ┌──────────────────────┐        ┌──────────────────────────┐
//! │   SqliteConnection   │        │     WorkerConnection     │
//! │   (rusqlite, Mutex)  │        │ (NDJSON over child stdio)│
//! └──────────────────────┘        └──────────────────────────┘
//! ```

mod manager;
mod session;
mod sqlite;
mod worker;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SourceResult;
use crate::metadata::SchemaIntrospector;
use crate::result::ResultSet;
use crate::statement::BoundStatement;
use crate::types::SourceDialect;

pub use manager::ConnectionManager;
pub use session::Session;
pub use sqlite::SqliteConnection;
pub use worker::WorkerConnection;

/// Catalog/schema labels of a table inside a wrapped source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhysicalLocation {
    pub catalog: Option<String>,
    pub schema: Option<String>,
}

/// A sub-connection a logical schema wraps.
#[async_trait]
pub trait FederatedSource: Send + Sync {
    /// Metadata of the wrapped connection.
    fn metadata(&self) -> &dyn SchemaIntrospector;

    /// Where the wrapped connection keeps `table`.
    ///
    /// Missing labels fall back to the logical catalog/schema.
    async fn table_location(&self, table: &str) -> SourceResult<PhysicalLocation>;
}

/// What the root schema knows about one of its sub-schemas.
#[derive(Clone)]
pub struct SchemaHandle {
    pub name: String,
    pub dialect: SourceDialect,
    pub federated: Option<Arc<dyn FederatedSource>>,
}

impl SchemaHandle {
    /// A plain schema, answered by the root connection.
    pub fn local(name: impl Into<String>, dialect: SourceDialect) -> Self {
        Self {
            name: name.into(),
            dialect,
            federated: None,
        }
    }

    pub fn federated(
        name: impl Into<String>,
        dialect: SourceDialect,
        source: Arc<dyn FederatedSource>,
    ) -> Self {
        Self {
            name: name.into(),
            dialect,
            federated: Some(source),
        }
    }

    pub fn is_federated(&self) -> bool {
        self.federated.is_some()
    }
}

impl fmt::Debug for SchemaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaHandle")
            .field("name", &self.name)
            .field("dialect", &self.dialect)
            .field("federated", &self.is_federated())
            .finish()
    }
}

/// A live connection to a source.
///
/// A connection is used by one pipeline at a time, from preparation through
/// the last fetched row.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Root metadata of the connection.
    fn metadata(&self) -> &dyn SchemaIntrospector;

    /// Resolve a sub-schema of the root schema.
    async fn sub_schema(&self, name: &str) -> SourceResult<SchemaHandle>;

    /// Prepare `sql` and report how many bind parameters it declares.
    async fn prepare(&self, sql: &str) -> SourceResult<usize>;

    /// Execute a bound statement and fetch every row.
    async fn execute(&self, statement: &BoundStatement) -> SourceResult<ResultSet>;

    /// The dialect's explain-plan form of `query`.
    fn explain_sql(&self, query: &str) -> String {
        format!("explain plan for {}", query)
    }

    /// Release the connection.
    async fn close(&self) -> SourceResult<()> {
        Ok(())
    }
}
