//! Engine worker backend.
//!
//! The worker owns the real connection, root schema and any federated
//! sub-connections; this side only speaks the NDJSON protocol.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::{Connection, FederatedSource, PhysicalLocation, SchemaHandle};
use crate::config::ModelDescriptor;
use crate::error::{ConnectionError, SourceError, SourceResult};
use crate::metadata::{ColumnEntry, ExportedKey, PrimaryKeyEntry, SchemaIntrospector, TableEntry};
use crate::result::{ResultSet, SqlValue};
use crate::statement::BoundStatement;
use crate::types::SourceDialect;
use crate::worker::protocol::*;
use crate::worker::{WorkerClient, WorkerError};

/// Metadata answered by the worker, for the root connection or one
/// federated sub-connection.
#[derive(Clone)]
struct WorkerIntrospector {
    client: Arc<WorkerClient>,
    connection: ConnectionParams,
}

impl WorkerIntrospector {
    fn scoped(&self, sub_schema: &str) -> Self {
        Self {
            client: self.client.clone(),
            connection: ConnectionParams {
                model: self.connection.model.clone(),
                sub_schema: Some(sub_schema.to_string()),
            },
        }
    }

    fn table_params(&self, catalog: &str, schema: &str, table: &str) -> TableParams {
        TableParams {
            connection: self.connection.clone(),
            catalog: catalog.to_string(),
            schema: schema.to_string(),
            table: table.to_string(),
        }
    }
}

#[async_trait]
impl SchemaIntrospector for WorkerIntrospector {
    async fn catalogs(&self) -> SourceResult<Vec<String>> {
        let response: ListCatalogsResponse = self
            .client
            .request(
                methods::LIST_CATALOGS,
                ModelParams {
                    connection: self.connection.clone(),
                },
            )
            .await?;
        Ok(response.catalogs)
    }

    async fn schemas(&self, catalog: &str) -> SourceResult<Vec<String>> {
        let response: ListSchemasResponse = self
            .client
            .request(
                methods::LIST_SCHEMAS,
                ListSchemasParams {
                    connection: self.connection.clone(),
                    catalog: catalog.to_string(),
                },
            )
            .await?;
        Ok(response.schemas)
    }

    async fn table_types(&self) -> SourceResult<Vec<String>> {
        let response: ListTableTypesResponse = self
            .client
            .request(
                methods::LIST_TABLE_TYPES,
                ModelParams {
                    connection: self.connection.clone(),
                },
            )
            .await?;
        Ok(response.table_types)
    }

    async fn tables(
        &self,
        catalog: &str,
        schema: &str,
        types: &[String],
    ) -> SourceResult<Vec<TableEntry>> {
        let response: ListTablesResponse = self
            .client
            .request(
                methods::LIST_TABLES,
                ListTablesParams {
                    connection: self.connection.clone(),
                    catalog: catalog.to_string(),
                    schema: schema.to_string(),
                    types: types.to_vec(),
                },
            )
            .await?;
        Ok(response.tables)
    }

    async fn primary_keys(
        &self,
        catalog: &str,
        schema: &str,
        table: &str,
    ) -> SourceResult<Vec<PrimaryKeyEntry>> {
        let response: PrimaryKeysResponse = self
            .client
            .request(methods::GET_PRIMARY_KEYS, self.table_params(catalog, schema, table))
            .await?;
        Ok(response.primary_keys)
    }

    async fn exported_keys(
        &self,
        catalog: &str,
        schema: &str,
        table: &str,
    ) -> SourceResult<Vec<ExportedKey>> {
        let response: ExportedKeysResponse = self
            .client
            .request(methods::GET_EXPORTED_KEYS, self.table_params(catalog, schema, table))
            .await?;
        Ok(response.exported_keys)
    }

    async fn columns(
        &self,
        catalog: &str,
        schema: &str,
        table: &str,
    ) -> SourceResult<Vec<ColumnEntry>> {
        let response: ColumnsResponse = self
            .client
            .request(methods::GET_COLUMNS, self.table_params(catalog, schema, table))
            .await?;
        Ok(response.columns)
    }
}

/// A sub-connection the worker's root schema wraps.
struct WorkerFederatedSource {
    introspector: WorkerIntrospector,
}

#[async_trait]
impl FederatedSource for WorkerFederatedSource {
    fn metadata(&self) -> &dyn SchemaIntrospector {
        &self.introspector
    }

    async fn table_location(&self, table: &str) -> SourceResult<PhysicalLocation> {
        let response: TableLocationResponse = self
            .introspector
            .client
            .request(
                methods::GET_TABLE_LOCATION,
                TableLocationParams {
                    connection: self.introspector.connection.clone(),
                    table: table.to_string(),
                },
            )
            .await?;
        Ok(PhysicalLocation {
            catalog: response.catalog,
            schema: response.schema,
        })
    }
}

/// Connection served by an engine worker process.
pub struct WorkerConnection {
    root: WorkerIntrospector,
}

impl WorkerConnection {
    /// Spawn the worker and open the model.
    pub async fn open(descriptor: &ModelDescriptor) -> Result<Self, ConnectionError> {
        let worker_path = descriptor.worker_path.as_deref().ok_or_else(|| {
            ConnectionError::InvalidDescriptor("worker driver requires a worker path".to_string())
        })?;

        let client = WorkerClient::spawn(
            worker_path,
            &descriptor.worker_args,
            Duration::from_secs(descriptor.timeout_secs),
        )
        .await
        .map_err(|e| match e {
            WorkerError::SpawnFailed(_) => {
                ConnectionError::DriverNotFound(format!("{}: {}", worker_path, e))
            }
            other => ConnectionError::Handshake {
                target: descriptor.to_string(),
                source: other.into(),
            },
        })?;

        let connection = ConnectionParams {
            model: descriptor.model.clone(),
            sub_schema: None,
        };
        let opened: OpenResponse = client
            .request(
                methods::OPEN,
                ModelParams {
                    connection: connection.clone(),
                },
            )
            .await
            .map_err(|e| match e {
                WorkerError::DriverNotFound(message) => ConnectionError::DriverNotFound(message),
                other => ConnectionError::Handshake {
                    target: descriptor.to_string(),
                    source: other.into(),
                },
            })?;
        info!(
            model = %descriptor.model,
            product = opened.product_name.as_deref().unwrap_or("unknown"),
            version = opened.product_version.as_deref().unwrap_or("unknown"),
            "opened worker connection"
        );

        Ok(Self {
            root: WorkerIntrospector {
                client: Arc::new(client),
                connection,
            },
        })
    }

    fn client(&self) -> &WorkerClient {
        &self.root.client
    }
}

#[async_trait]
impl Connection for WorkerConnection {
    fn metadata(&self) -> &dyn SchemaIntrospector {
        &self.root
    }

    async fn sub_schema(&self, name: &str) -> SourceResult<SchemaHandle> {
        let response: SubSchemaResponse = self
            .client()
            .request(
                methods::GET_SUB_SCHEMA,
                SubSchemaParams {
                    connection: self.root.connection.clone(),
                    name: name.to_string(),
                },
            )
            .await?;

        let dialect = response
            .dialect
            .as_deref()
            .map(SourceDialect::from_name)
            .unwrap_or_default();
        if response.federated {
            let source = WorkerFederatedSource {
                introspector: self.root.scoped(&response.name),
            };
            Ok(SchemaHandle::federated(response.name, dialect, Arc::new(source)))
        } else {
            Ok(SchemaHandle::local(response.name, dialect))
        }
    }

    async fn prepare(&self, sql: &str) -> SourceResult<usize> {
        let response: PrepareResponse = self
            .client()
            .request(
                methods::PREPARE,
                PrepareParams {
                    connection: self.root.connection.clone(),
                    sql: sql.to_string(),
                },
            )
            .await?;
        Ok(response.parameter_count)
    }

    async fn execute(&self, statement: &BoundStatement) -> SourceResult<ResultSet> {
        let response: ExecuteResponse = self
            .client()
            .request(
                methods::EXECUTE,
                ExecuteParams {
                    connection: self.root.connection.clone(),
                    sql: statement.sql.clone(),
                    args: statement.params.clone(),
                },
            )
            .await?;

        let width = response.columns.len();
        let mut result = ResultSet::new(response.columns);
        for row in response.rows {
            if row.len() != width {
                return Err(SourceError::other(format!(
                    "worker returned a row of {} cells for {} columns",
                    row.len(),
                    width
                )));
            }
            result.push_row(row.into_iter().map(SqlValue::from_json).collect());
        }
        Ok(result)
    }

    async fn close(&self) -> SourceResult<()> {
        self.client().shutdown().await?;
        Ok(())
    }
}
