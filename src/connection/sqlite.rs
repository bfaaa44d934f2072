//! SQLite backend.
//!
//! Answers metadata from `sqlite_master` and the table pragmas, reporting
//! declared column types the way the federating engine spells SQLite types
//! (`TEXT` → `VARCHAR(65536)`, `INT` → `INTEGER`, ...). Every attached
//! database is a schema of the unnamed catalog `""`.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, OpenFlags};
use tracing::{debug, info};

use super::{Connection, SchemaHandle};
use crate::config::ModelDescriptor;
use crate::error::{ConnectionError, SourceError, SourceResult};
use crate::metadata::{ColumnEntry, ExportedKey, PrimaryKeyEntry, SchemaIntrospector, TableEntry};
use crate::result::sql_type::type_codes;
use crate::result::{type_code_for_name, ResultColumn, ResultSet, SqlValue};
use crate::statement::BoundStatement;
use crate::types::SourceDialect;

/// The only catalog SQLite has.
pub const SQLITE_CATALOG: &str = "";

/// Table type reported for `sqlite_*` internal tables.
const SYSTEM_TABLE: &str = "SYSTEM TABLE";

/// A SQLite database, guarded for exclusive use.
pub struct SqliteConnection {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteConnection {
    /// Open the database a descriptor names. The file must already exist.
    pub fn open(descriptor: &ModelDescriptor) -> Result<Self, ConnectionError> {
        let handshake = |source: rusqlite::Error| ConnectionError::Handshake {
            target: descriptor.to_string(),
            source: source.into(),
        };

        let conn = if descriptor.is_memory() {
            rusqlite::Connection::open_in_memory().map_err(handshake)?
        } else {
            let path = descriptor.model.as_str();
            if !path.starts_with("file:") && !Path::new(path).exists() {
                return Err(ConnectionError::DriverNotFound(format!(
                    "database file not found: {}",
                    path
                )));
            }
            rusqlite::Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(handshake)?
        };

        // Forces SQLite to read the header so a non-database file fails here.
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(handshake)?;

        info!(model = %descriptor.model, "opened sqlite connection");
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already open rusqlite connection.
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&rusqlite::Connection) -> rusqlite::Result<T>,
    ) -> SourceResult<T> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| SourceError::other("sqlite connection lock poisoned"))?;
        Ok(f(&guard)?)
    }

    fn database_names(&self) -> SourceResult<Vec<String>> {
        self.with_conn(|c| {
            let mut stmt = c.prepare("PRAGMA database_list")?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(1))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(names.into_iter().filter(|n| n != "temp").collect())
        })
    }

    fn table_names(&self, schema: &str) -> SourceResult<Vec<(String, String)>> {
        let sql = format!(
            "SELECT name, type FROM {}.sqlite_master WHERE type IN ('table', 'view') ORDER BY name",
            quote_ident(schema)
        );
        self.with_conn(|c| {
            let mut stmt = c.prepare(&sql)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    fn table_info(&self, schema: &str, table: &str) -> SourceResult<Vec<TableInfoRow>> {
        let sql = format!(
            "PRAGMA {}.table_info({})",
            quote_ident(schema),
            quote_ident(table)
        );
        self.with_conn(|c| {
            let mut stmt = c.prepare(&sql)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(TableInfoRow {
                        name: row.get(1)?,
                        declared_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        not_null: row.get::<_, i64>(3)? != 0,
                        pk: row.get(5)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    fn foreign_keys(&self, schema: &str, table: &str) -> SourceResult<Vec<ForeignKeyRow>> {
        let sql = format!(
            "PRAGMA {}.foreign_key_list({})",
            quote_ident(schema),
            quote_ident(table)
        );
        self.with_conn(|c| {
            let mut stmt = c.prepare(&sql)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ForeignKeyRow {
                        seq: row.get(1)?,
                        table: row.get(2)?,
                        from: row.get(3)?,
                        to: row.get(4)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }
}

struct TableInfoRow {
    name: String,
    declared_type: String,
    not_null: bool,
    pk: i32,
}

struct ForeignKeyRow {
    seq: i32,
    table: String,
    from: String,
    to: Option<String>,
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Spell a declared SQLite column type the way the federating engine
/// reports it.
pub fn engine_type_name(declared: &str, not_null: bool) -> String {
    let upper = declared.trim().to_uppercase();
    let base = upper.split('(').next().unwrap_or("").trim().to_string();

    let name = if base.is_empty() {
        "ANY".to_string()
    } else if base.contains("INT") {
        "INTEGER".to_string()
    } else if base.contains("CHAR") || base.contains("CLOB") || base.contains("TEXT") {
        "VARCHAR(65536)".to_string()
    } else if base == "BLOB" {
        "VARBINARY".to_string()
    } else if base.contains("REAL") || base.contains("FLOA") || base.contains("DOUB") {
        "DOUBLE".to_string()
    } else if base.starts_with("BOOL") {
        "BOOLEAN".to_string()
    } else if base == "DATE" {
        "DATE".to_string()
    } else if base == "DATETIME" || base == "TIMESTAMP" {
        "TIMESTAMP(0)".to_string()
    } else if base == "DECIMAL" || base == "NUMERIC" {
        upper.replace("NUMERIC", "DECIMAL").replace(' ', "")
    } else {
        upper
    };

    if not_null {
        format!("{} NOT NULL", name)
    } else {
        name
    }
}

/// JDBC type code for a result column with a declared type.
fn declared_type_code(declared: &str) -> i32 {
    let upper = declared.trim().to_uppercase();
    // SQLite REAL is 8 bytes wide.
    if upper.starts_with("REAL") {
        return type_codes::DOUBLE;
    }
    type_code_for_name(&upper)
}

/// JDBC type code for an expression column, from its first non-null value.
fn value_type_code(value: &SqlValue) -> i32 {
    match value {
        SqlValue::Integer(_) => type_codes::BIGINT,
        SqlValue::Double(_) => type_codes::DOUBLE,
        SqlValue::Text(_) => type_codes::VARCHAR,
        SqlValue::Bytes(_) => type_codes::VARBINARY,
        _ => type_codes::NULL,
    }
}

/// Type code for a column without a declared type, taken from every non-null
/// value. Integers mixed with reals widen to DOUBLE; any other mix of storage
/// classes falls back to OTHER so each cell renders by its own shape.
fn expression_type_code<'a>(values: impl Iterator<Item = &'a SqlValue>) -> i32 {
    let mut code = type_codes::NULL;
    for value in values.filter(|v| !v.is_null()) {
        let next = value_type_code(value);
        code = match (code, next) {
            (type_codes::NULL, next) => next,
            (current, next) if current == next => current,
            (type_codes::BIGINT, type_codes::DOUBLE) | (type_codes::DOUBLE, type_codes::BIGINT) => {
                type_codes::DOUBLE
            }
            _ => return type_codes::OTHER,
        };
    }
    code
}

fn to_sql_value(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Integer(i),
        ValueRef::Real(d) => SqlValue::Double(d),
        ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => SqlValue::Bytes(bytes.to_vec()),
    }
}

#[async_trait]
impl SchemaIntrospector for SqliteConnection {
    async fn catalogs(&self) -> SourceResult<Vec<String>> {
        Ok(vec![SQLITE_CATALOG.to_string()])
    }

    async fn schemas(&self, _catalog: &str) -> SourceResult<Vec<String>> {
        self.database_names()
    }

    async fn table_types(&self) -> SourceResult<Vec<String>> {
        Ok(vec![
            "TABLE".to_string(),
            "VIEW".to_string(),
            SYSTEM_TABLE.to_string(),
        ])
    }

    async fn tables(
        &self,
        catalog: &str,
        schema: &str,
        types: &[String],
    ) -> SourceResult<Vec<TableEntry>> {
        let entries = self
            .table_names(schema)?
            .into_iter()
            .map(|(name, kind)| {
                let table_type = if name.starts_with("sqlite_") {
                    SYSTEM_TABLE.to_string()
                } else {
                    kind.to_uppercase()
                };
                TableEntry {
                    catalog: catalog.to_string(),
                    schema: schema.to_string(),
                    name,
                    table_type,
                    remarks: None,
                }
            })
            .filter(|t| types.iter().any(|ty| ty == &t.table_type))
            .collect();
        Ok(entries)
    }

    async fn primary_keys(
        &self,
        _catalog: &str,
        schema: &str,
        table: &str,
    ) -> SourceResult<Vec<PrimaryKeyEntry>> {
        Ok(self
            .table_info(schema, table)?
            .into_iter()
            .filter(|c| c.pk > 0)
            .map(|c| PrimaryKeyEntry {
                column_name: c.name,
                key_seq: c.pk,
                pk_name: None,
            })
            .collect())
    }

    async fn exported_keys(
        &self,
        catalog: &str,
        schema: &str,
        table: &str,
    ) -> SourceResult<Vec<ExportedKey>> {
        let mut target_pk: Option<Vec<String>> = None;
        let mut keys = Vec::new();

        for (sibling, kind) in self.table_names(schema)? {
            if kind != "table" {
                continue;
            }
            for fk in self.foreign_keys(schema, &sibling)? {
                if !fk.table.eq_ignore_ascii_case(table) {
                    continue;
                }
                // A NULL target column means the referenced table's primary key.
                let pk_column = match fk.to {
                    Some(to) => to,
                    None => {
                        if target_pk.is_none() {
                            let mut pk = self.primary_keys(catalog, schema, table).await?;
                            pk.sort_by_key(|p| p.key_seq);
                            target_pk = Some(pk.into_iter().map(|p| p.column_name).collect());
                        }
                        target_pk
                            .as_ref()
                            .and_then(|pk| pk.get(fk.seq as usize).cloned())
                            .unwrap_or_default()
                    }
                };
                keys.push(ExportedKey {
                    pk_table_catalog: Some(catalog.to_string()),
                    pk_table_schema: Some(schema.to_string()),
                    pk_table_name: table.to_string(),
                    pk_column_name: pk_column,
                    pk_name: None,
                    fk_table_catalog: Some(catalog.to_string()),
                    fk_table_schema: Some(schema.to_string()),
                    fk_table_name: sibling.clone(),
                    fk_column_name: fk.from,
                    fk_name: None,
                });
            }
        }
        Ok(keys)
    }

    async fn columns(
        &self,
        _catalog: &str,
        schema: &str,
        table: &str,
    ) -> SourceResult<Vec<ColumnEntry>> {
        Ok(self
            .table_info(schema, table)?
            .into_iter()
            .map(|c| ColumnEntry {
                type_name: engine_type_name(&c.declared_type, c.not_null),
                nullable: !c.not_null,
                name: c.name,
                remarks: None,
            })
            .collect())
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    fn metadata(&self) -> &dyn SchemaIntrospector {
        self
    }

    async fn sub_schema(&self, name: &str) -> SourceResult<SchemaHandle> {
        if !self.database_names()?.iter().any(|n| n == name) {
            return Err(SourceError::other(format!("no such schema: {}", name)));
        }
        Ok(SchemaHandle::local(name, SourceDialect::Sqlite))
    }

    async fn prepare(&self, sql: &str) -> SourceResult<usize> {
        self.with_conn(|c| Ok(c.prepare(sql)?.parameter_count()))
    }

    async fn execute(&self, statement: &BoundStatement) -> SourceResult<ResultSet> {
        debug!(sql = %statement.sql, "executing sqlite statement");
        self.with_conn(|c| {
            let mut stmt = c.prepare(&statement.sql)?;
            let declared: Vec<(String, Option<String>)> = stmt
                .columns()
                .iter()
                .map(|col| (col.name().to_string(), col.decl_type().map(str::to_string)))
                .collect();

            let mut rows = Vec::new();
            let mut query = stmt.query(params_from_iter(statement.params.iter()))?;
            while let Some(row) = query.next()? {
                let mut cells = Vec::with_capacity(declared.len());
                for i in 0..declared.len() {
                    cells.push(to_sql_value(row.get_ref(i)?));
                }
                rows.push(cells);
            }

            let columns = declared
                .into_iter()
                .enumerate()
                .map(|(i, (label, decl))| match decl {
                    Some(decl) => ResultColumn::new(label, declared_type_code(&decl), decl),
                    None => {
                        let code = expression_type_code(rows.iter().map(|r| &r[i]));
                        ResultColumn::new(label, code, "")
                    }
                })
                .collect();

            Ok(ResultSet { columns, rows })
        })
    }

    fn explain_sql(&self, query: &str) -> String {
        format!("EXPLAIN QUERY PLAN {}", query)
    }
}
