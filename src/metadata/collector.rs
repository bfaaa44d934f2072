//! Schema snapshot collection.
//!
//! Walks catalogs → schemas → tables of a connection, resolves physical
//! identifiers and keys through federated sub-connections, and normalizes
//! every column type.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, info, warn};

use super::introspector::SchemaIntrospector;
use super::types::{
    ColumnMetadata, KeyKind, KeyLookup, KeyLookupFailure, SchemaSnapshot, TableEntry,
    TableMetadata,
};
use crate::connection::{Connection, SchemaHandle};
use crate::error::MetadataError;
use crate::observe::{Counter, ExecContext, Operation, Unit};
use crate::types::{normalize, SourceDialect, TypeContext};

/// Table types never collected.
pub const DENIED_TABLE_TYPES: [&str; 5] = [
    "INDEX",
    "SEQUENCE",
    "SYSTEM INDEX",
    "SYSTEM TABLE",
    "SYSTEM TOAST INDEX",
];

/// Table types always requested, whether or not the source lists them.
pub const EXTRA_TABLE_TYPES: [&str; 2] = ["STREAM", "BASE_TABLE"];

/// Source-reported table types minus the deny list, plus the extras.
pub fn effective_table_types(reported: &[String]) -> Vec<String> {
    let mut types: Vec<String> = Vec::with_capacity(reported.len() + EXTRA_TABLE_TYPES.len());
    for t in reported {
        if !DENIED_TABLE_TYPES.contains(&t.as_str()) && !types.contains(t) {
            types.push(t.clone());
        }
    }
    for extra in EXTRA_TABLE_TYPES {
        if !types.iter().any(|t| t == extra) {
            types.push(extra.to_string());
        }
    }
    types
}

/// Collect every table of the connection, keys included, columns empty.
pub async fn collect_tables(
    conn: &dyn Connection,
    ctx: &ExecContext,
) -> Result<Vec<TableMetadata>, MetadataError> {
    let mut unit = ctx.unit(Operation::CollectTables);
    let result = walk_tables(conn, &mut unit).await;
    if let Ok(tables) = &result {
        unit.counter(Counter::Tables, tables.len() as u64);
        info!(tables = tables.len(), "collected tables");
    }
    unit.finish_with(result)
}

/// Read and normalize the columns of one table.
pub async fn collect_columns(
    conn: &dyn Connection,
    table: &TableMetadata,
    ctx: &ExecContext,
) -> Result<BTreeMap<String, ColumnMetadata>, MetadataError> {
    let dialect = match resolve_schema(conn, &table.schema).await {
        Ok(handle) => handle.dialect,
        Err(e) => {
            ctx.unit(Operation::CollectColumns).finish_err(&e);
            return Err(e);
        }
    };
    columns_for(conn, table, dialect, ctx).await
}

/// Build a complete snapshot: tables, keys and normalized columns.
pub async fn collect(
    conn: &dyn Connection,
    ctx: &ExecContext,
) -> Result<SchemaSnapshot, MetadataError> {
    let mut unit = ctx.unit(Operation::CollectSnapshot);
    let result = build_snapshot(conn, ctx).await;
    if let Ok(snapshot) = &result {
        let columns: usize = snapshot.tables().iter().map(|t| t.columns.len()).sum();
        unit.counter(Counter::Tables, snapshot.len() as u64);
        unit.counter(Counter::Columns, columns as u64);
        let partial = snapshot.partial_tables().count();
        if partial > 0 {
            unit.attribute("partial_tables", partial.to_string());
        }
    }
    unit.finish_with(result)
}

async fn build_snapshot(
    conn: &dyn Connection,
    ctx: &ExecContext,
) -> Result<SchemaSnapshot, MetadataError> {
    let mut tables = collect_tables(conn, ctx).await?;

    let mut dialects: HashMap<String, SourceDialect> = HashMap::new();
    for table in tables.iter_mut() {
        let dialect = match dialects.get(&table.schema) {
            Some(d) => *d,
            None => {
                let d = resolve_schema(conn, &table.schema).await?.dialect;
                dialects.insert(table.schema.clone(), d);
                d
            }
        };
        table.columns = columns_for(conn, table, dialect, ctx).await?;
    }

    Ok(SchemaSnapshot::new(tables))
}

async fn resolve_schema(conn: &dyn Connection, schema: &str) -> Result<SchemaHandle, MetadataError> {
    conn.sub_schema(schema)
        .await
        .map_err(|source| MetadataError::SubSchema {
            schema: schema.to_string(),
            source,
        })
}

async fn walk_tables(
    conn: &dyn Connection,
    unit: &mut Unit<'_>,
) -> Result<Vec<TableMetadata>, MetadataError> {
    let root = conn.metadata();
    let catalogs = root.catalogs().await.map_err(MetadataError::Catalogs)?;
    let reported_types = root.table_types().await.map_err(MetadataError::TableTypes)?;
    let types = effective_table_types(&reported_types);
    debug!(?types, "table types");

    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut tables = Vec::new();

    for catalog in &catalogs {
        let schemas = root
            .schemas(catalog)
            .await
            .map_err(|source| MetadataError::Schemas {
                catalog: catalog.clone(),
                source,
            })?;

        for schema in &schemas {
            let handle = resolve_schema(conn, schema).await?;
            let entries = root
                .tables(catalog, schema, &types)
                .await
                .map_err(|source| MetadataError::Tables {
                    catalog: catalog.clone(),
                    schema: schema.clone(),
                    source,
                })?;

            for entry in entries {
                let identity = (catalog.clone(), schema.clone(), entry.name.clone());
                if !seen.insert(identity) {
                    debug!(catalog = %catalog, schema = %schema, table = %entry.name, "skipping duplicate table");
                    continue;
                }
                let table = describe_table(conn, &handle, catalog, schema, entry, unit).await;
                tables.push(table);
            }
        }
    }

    Ok(tables)
}

/// Resolve physical identifiers and keys of one table. Key failures are
/// recorded on the table, never propagated.
async fn describe_table(
    conn: &dyn Connection,
    handle: &SchemaHandle,
    catalog: &str,
    schema: &str,
    entry: TableEntry,
    unit: &mut Unit<'_>,
) -> TableMetadata {
    let (physical_catalog, physical_schema) = match &handle.federated {
        Some(source) => match source.table_location(&entry.name).await {
            Ok(location) => (
                location.catalog.unwrap_or_else(|| catalog.to_string()),
                location.schema.unwrap_or_else(|| schema.to_string()),
            ),
            Err(e) => {
                warn!(table = %entry.name, error = %e, "table location unavailable, using logical names");
                (catalog.to_string(), schema.to_string())
            }
        },
        None => (catalog.to_string(), schema.to_string()),
    };

    let keys: &dyn SchemaIntrospector = match &handle.federated {
        Some(source) => source.metadata(),
        None => conn.metadata(),
    };

    let mut key_lookup = KeyLookup::Complete;

    let primary_keys = match keys
        .primary_keys(&physical_catalog, &physical_schema, &entry.name)
        .await
    {
        Ok(mut rows) => {
            rows.sort_by_key(|r| r.key_seq);
            rows.into_iter().map(|r| r.column_name).collect()
        }
        Err(e) => {
            let failure = KeyLookupFailure {
                kind: KeyKind::PrimaryKeys,
                message: e.to_string(),
            };
            record_key_failure(unit, &mut key_lookup, &entry.name, failure);
            Vec::new()
        }
    };

    let exported_keys = match keys
        .exported_keys(&physical_catalog, &physical_schema, &entry.name)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            let failure = KeyLookupFailure {
                kind: KeyKind::ExportedKeys,
                message: e.to_string(),
            };
            record_key_failure(unit, &mut key_lookup, &entry.name, failure);
            Vec::new()
        }
    };

    TableMetadata {
        catalog: catalog.to_string(),
        schema: schema.to_string(),
        name: entry.name,
        physical_catalog,
        physical_schema,
        description: entry.remarks,
        primary_keys,
        exported_keys,
        columns: BTreeMap::new(),
        key_lookup,
    }
}

fn record_key_failure(
    unit: &mut Unit<'_>,
    key_lookup: &mut KeyLookup,
    table: &str,
    failure: KeyLookupFailure,
) {
    warn!(table = %table, error = %failure, "key lookup failed");
    unit.attribute("key_lookup_failure", format!("{}: {}", table, failure));
    key_lookup.record(failure);
}

async fn columns_for(
    conn: &dyn Connection,
    table: &TableMetadata,
    dialect: SourceDialect,
    ctx: &ExecContext,
) -> Result<BTreeMap<String, ColumnMetadata>, MetadataError> {
    let mut unit = ctx.unit(Operation::CollectColumns);
    unit.attribute("table", table.qualified_name());

    let entries = match conn
        .metadata()
        .columns(&table.catalog, &table.schema, &table.name)
        .await
    {
        Ok(entries) => entries,
        Err(source) => {
            let err = MetadataError::Columns {
                schema: table.schema.clone(),
                table: table.name.clone(),
                source,
            };
            unit.finish_err(&err);
            return Err(err);
        }
    };

    let mut columns = BTreeMap::new();
    for entry in entries {
        let type_ctx = TypeContext::new(dialect, &table.name, &entry.name);
        let normalized = normalize(&entry.type_name, &type_ctx);
        if let Some(diagnostic) = &normalized.diagnostic {
            warn!(%diagnostic, "unknown column type");
            unit.attribute("unknown_type", diagnostic.to_string());
        }
        columns.entry(entry.name.clone()).or_insert(ColumnMetadata {
            name: entry.name,
            scalar_type: normalized.scalar_type,
            nullable: entry.nullable,
            description: entry.remarks,
        });
    }

    unit.counter(Counter::Columns, columns.len() as u64);
    unit.finish_ok();
    Ok(columns)
}
