//! A connection plus its lazily collected schema snapshot.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::{Connection, ConnectionManager};
use crate::config::{ModelDescriptor, QuerySettings};
use crate::error::{ConnectionError, MetadataError, SourceResult};
use crate::metadata::{self, SchemaSnapshot};
use crate::observe::ExecContext;
use crate::query;
use crate::result::RowFixes;
use crate::statement::StatementTemplater;

/// One open model.
///
/// Every pipeline takes `&mut self`, so a statement owns the connection from
/// preparation until its last row is fetched.
pub struct Session {
    descriptor: ModelDescriptor,
    conn: Box<dyn Connection>,
    snapshot: Option<Arc<SchemaSnapshot>>,
    templater: StatementTemplater,
    fixes: bool,
    ctx: ExecContext,
}

impl Session {
    /// Open a connection for `descriptor` and wrap it.
    pub async fn open(
        descriptor: ModelDescriptor,
        ctx: ExecContext,
    ) -> Result<Self, ConnectionError> {
        let conn = ConnectionManager::open(&descriptor, &ctx).await?;
        Ok(Self::from_connection(descriptor, conn, ctx))
    }

    /// Wrap an already open connection.
    pub fn from_connection(
        descriptor: ModelDescriptor,
        conn: Box<dyn Connection>,
        ctx: ExecContext,
    ) -> Self {
        let defaults = QuerySettings::default();
        Self {
            descriptor,
            conn,
            snapshot: None,
            templater: StatementTemplater::new(defaults.sentinel),
            fixes: defaults.fixes,
            ctx,
        }
    }

    pub fn with_settings(mut self, settings: &QuerySettings) -> Self {
        self.templater = StatementTemplater::new(settings.sentinel.clone());
        self.fixes = settings.fixes;
        self
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    pub fn connection(&self) -> &dyn Connection {
        self.conn.as_ref()
    }

    pub fn templater(&self) -> &StatementTemplater {
        &self.templater
    }

    /// The snapshot, collecting it on first use.
    ///
    /// A failed collection is not cached; the next call retries.
    pub async fn snapshot(&mut self) -> Result<Arc<SchemaSnapshot>, MetadataError> {
        if let Some(snapshot) = &self.snapshot {
            return Ok(snapshot.clone());
        }
        let snapshot = Arc::new(metadata::collect(self.conn.as_ref(), &self.ctx).await?);
        self.snapshot = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// The snapshot if one has been collected.
    pub fn cached_snapshot(&self) -> Option<&Arc<SchemaSnapshot>> {
        self.snapshot.as_ref()
    }

    /// Drop the cached snapshot so the next access re-collects it.
    pub fn refresh(&mut self) {
        debug!(model = %self.descriptor, "dropping cached snapshot");
        self.snapshot = None;
    }

    /// Close the current connection and open a fresh one.
    ///
    /// The snapshot is dropped either way. If the new connection cannot be
    /// opened the old one stays in place, already closed.
    pub async fn reconnect(&mut self) -> Result<(), ConnectionError> {
        if let Err(e) = self.conn.close().await {
            warn!(model = %self.descriptor, error = %e, "failed to close connection");
        }
        self.snapshot = None;
        self.conn = ConnectionManager::open(&self.descriptor, &self.ctx).await?;
        Ok(())
    }

    /// The snapshot serialized for the query composer.
    pub async fn models_json(&mut self) -> Result<Value, MetadataError> {
        Ok(self.snapshot().await?.to_json())
    }

    /// Run a query, returning rows or an error envelope.
    pub async fn query_models(&mut self, sql: &str) -> Value {
        self.query_models_with_fields(sql, &[]).await
    }

    /// Like [`Session::query_models`], filling in `expected` fields missing
    /// from structured rows.
    pub async fn query_models_with_fields(&mut self, sql: &str, expected: &[String]) -> Value {
        let fixes = RowFixes::with_expected_fields(expected.iter().cloned());
        let fixes = self.fixes.then_some(&fixes);
        query::query_models(self.conn.as_ref(), &self.templater, sql, fixes, &self.ctx).await
    }

    /// Explain a query, returning the flattened plan or an error envelope.
    pub async fn explain(&mut self, sql: &str) -> Value {
        query::explain(self.conn.as_ref(), &self.templater, sql, &self.ctx).await
    }

    /// Close the connection.
    pub async fn close(self) -> SourceResult<()> {
        self.conn.close().await
    }
}
