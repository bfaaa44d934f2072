#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use common::{ScriptedConnection, ScriptedFederation, ScriptedMetadata};
use relbridge::error::MetadataError;
use relbridge::metadata::{collect, collect_columns, collect_tables, ExportedKey, KeyKind};
use relbridge::observe::{Counter, ExecContext, MemorySink, Operation};
use relbridge::types::{CanonicalType, SourceDialect};

fn context() -> (ExecContext, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    (ExecContext::new(sink.clone()), sink)
}

fn orders_fk() -> ExportedKey {
    ExportedKey {
        pk_table_catalog: Some("shop".to_string()),
        pk_table_schema: Some("main".to_string()),
        pk_table_name: "customers".to_string(),
        pk_column_name: "id".to_string(),
        pk_name: None,
        fk_table_catalog: Some("shop".to_string()),
        fk_table_schema: Some("main".to_string()),
        fk_table_name: "orders".to_string(),
        fk_column_name: "customer_id".to_string(),
        fk_name: Some("fk_orders_customer".to_string()),
    }
}

fn shop() -> ScriptedMetadata {
    ScriptedMetadata::new()
        .with_table("shop", "main", "customers", "TABLE")
        .with_table("shop", "main", "orders", "TABLE")
        .with_table("shop", "main", "orders_idx", "INDEX")
        .with_columns(
            "shop",
            "main",
            "customers",
            &[("id", "INTEGER NOT NULL", false), ("name", "VARCHAR", true)],
        )
        .with_columns(
            "shop",
            "main",
            "orders",
            &[
                ("id", "INTEGER NOT NULL", false),
                ("customer_id", "INTEGER", true),
                ("total", "DECIMAL(10,2)", true),
                ("placed", "TIMESTAMP", true),
            ],
        )
        .with_primary_key("shop", "main", "customers", &["id"])
        .with_primary_key("shop", "main", "orders", &["id", "customer_id"])
        .with_exported_key("shop", "main", "customers", orders_fk())
}

#[tokio::test]
async fn test_collect_snapshot() {
    let conn = ScriptedConnection::new(shop());
    let (ctx, sink) = context();

    let snapshot = collect(&conn, &ctx).await.unwrap();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.find("orders_idx").is_none());

    let orders = snapshot.get("shop", "main", "orders").unwrap();
    assert_eq!(orders.primary_keys, vec!["id", "customer_id"]);
    assert_eq!(orders.physical_catalog, "shop");
    assert_eq!(orders.physical_schema, "main");
    assert_eq!(orders.columns.len(), 4);
    assert_eq!(orders.column("total").unwrap().scalar_type, CanonicalType::Float);
    assert_eq!(
        orders.column("placed").unwrap().scalar_type,
        CanonicalType::Timestamptz
    );
    assert!(!orders.column("id").unwrap().nullable);

    let customers = snapshot.find("customers").unwrap();
    assert_eq!(customers.exported_keys, vec![orders_fk()]);
    assert!(snapshot.partial_tables().next().is_none());

    let report = &sink.reports_for(Operation::CollectSnapshot)[0];
    assert!(report.status.is_ok());
    assert_eq!(report.counter(Counter::Tables), Some(2));
    assert_eq!(report.counter(Counter::Columns), Some(6));
    assert_eq!(sink.reports_for(Operation::CollectColumns).len(), 2);
}

#[tokio::test]
async fn test_table_types_skip_deny_list_and_add_streams() {
    let mut metadata = shop();
    metadata.table_types = vec![
        "TABLE".to_string(),
        "VIEW".to_string(),
        "INDEX".to_string(),
        "SEQUENCE".to_string(),
        "SYSTEM TOAST INDEX".to_string(),
    ];
    let conn = ScriptedConnection::new(metadata);
    let (ctx, _) = context();

    collect_tables(&conn, &ctx).await.unwrap();
    let requested = conn.root.requested_types.lock().unwrap().clone();
    assert_eq!(requested, vec!["TABLE", "VIEW", "STREAM", "BASE_TABLE"]);
}

#[tokio::test]
async fn test_federated_tables_use_physical_names() {
    let physical = ScriptedMetadata::new()
        .with_primary_key("warehouse", "public", "sales", &["sale_id"])
        .with_exported_key(
            "warehouse",
            "public",
            "sales",
            ExportedKey {
                pk_table_catalog: None,
                pk_table_schema: None,
                pk_table_name: "sales".to_string(),
                pk_column_name: "sale_id".to_string(),
                pk_name: None,
                fk_table_catalog: None,
                fk_table_schema: None,
                fk_table_name: "refunds".to_string(),
                fk_column_name: "sale_id".to_string(),
                fk_name: None,
            },
        );
    let federation = ScriptedFederation::new(physical)
        .with_location("sales", Some("warehouse"), Some("public"))
        .with_location("returns", None, Some("archive"));

    let root = ScriptedMetadata::new()
        .with_table("root", "wh", "sales", "TABLE")
        .with_table("root", "wh", "returns", "TABLE")
        .with_columns(
            "root",
            "wh",
            "sales",
            &[("sale_id", "BIGINT", false), ("sale_date", "VARCHAR(65536)", true)],
        );
    let conn = ScriptedConnection::new(root).with_federation(
        "wh",
        SourceDialect::Sqlite,
        federation,
    );
    let (ctx, _) = context();

    let snapshot = collect(&conn, &ctx).await.unwrap();

    let sales = snapshot.find("sales").unwrap();
    assert_eq!((sales.catalog.as_str(), sales.schema.as_str()), ("root", "wh"));
    assert_eq!(sales.physical_catalog, "warehouse");
    assert_eq!(sales.physical_schema, "public");
    assert_eq!(sales.primary_keys, vec!["sale_id"]);
    assert_eq!(sales.exported_keys.len(), 1);
    // Columns come from the root, normalized with the schema's dialect.
    assert_eq!(
        sales.column("sale_date").unwrap().scalar_type,
        CanonicalType::Timestamp
    );

    // Missing labels fall back to the logical ones.
    let returns = snapshot.find("returns").unwrap();
    assert_eq!(returns.physical_catalog, "root");
    assert_eq!(returns.physical_schema, "archive");

    // Keys were never asked of the root.
    assert!(!conn
        .root
        .calls()
        .iter()
        .any(|c| c.starts_with("primary_keys") || c.starts_with("exported_keys")));
}

#[tokio::test]
async fn test_key_failures_are_recovered() {
    let metadata = shop()
        .failing("primary_keys:orders")
        .failing("exported_keys:customers");
    let conn = ScriptedConnection::new(metadata);
    let (ctx, sink) = context();

    let snapshot = collect(&conn, &ctx).await.unwrap();
    assert_eq!(snapshot.len(), 2);

    let orders = snapshot.find("orders").unwrap();
    assert!(orders.primary_keys.is_empty());
    assert_eq!(orders.key_lookup.failures().len(), 1);
    assert_eq!(orders.key_lookup.failures()[0].kind, KeyKind::PrimaryKeys);
    assert_eq!(orders.columns.len(), 4);

    let customers = snapshot.find("customers").unwrap();
    assert_eq!(customers.primary_keys, vec!["id"]);
    assert!(customers.exported_keys.is_empty());
    assert_eq!(customers.key_lookup.failures()[0].kind, KeyKind::ExportedKeys);

    assert_eq!(snapshot.partial_tables().count(), 2);

    let tables_report = &sink.reports_for(Operation::CollectTables)[0];
    assert!(tables_report.status.is_ok());
    assert!(tables_report
        .attribute("key_lookup_failure")
        .is_some());
}

#[tokio::test]
async fn test_enumeration_failure_aborts() {
    let conn = ScriptedConnection::new(shop().failing("tables:main"));
    let (ctx, sink) = context();

    let err = collect(&conn, &ctx).await.unwrap_err();
    assert!(matches!(
        err,
        MetadataError::Tables { ref schema, .. } if schema == "main"
    ));
    assert!(!sink.reports_for(Operation::CollectSnapshot)[0].status.is_ok());
}

#[tokio::test]
async fn test_column_failure_aborts() {
    let conn = ScriptedConnection::new(shop().failing("columns:orders"));
    let (ctx, _) = context();

    let err = collect(&conn, &ctx).await.unwrap_err();
    assert!(matches!(
        err,
        MetadataError::Columns { ref table, .. } if table == "orders"
    ));
}

#[tokio::test]
async fn test_duplicate_tables_keep_first() {
    let metadata = shop().with_table("shop", "main", "orders", "VIEW");
    let conn = ScriptedConnection::new(metadata);
    let (ctx, _) = context();

    let tables = collect_tables(&conn, &ctx).await.unwrap();
    let orders: Vec<_> = tables.iter().filter(|t| t.name == "orders").collect();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].primary_keys, vec!["id", "customer_id"]);
}

#[tokio::test]
async fn test_collect_columns_for_one_table() {
    let conn = ScriptedConnection::new(
        shop().with_columns("shop", "main", "customers", &[("geom", "GEOMETRY", true)]),
    );
    let (ctx, sink) = context();

    let tables = collect_tables(&conn, &ctx).await.unwrap();
    let customers = tables.iter().find(|t| t.name == "customers").unwrap();
    let columns = collect_columns(&conn, customers, &ctx).await.unwrap();

    assert_eq!(columns["geom"].scalar_type, CanonicalType::Varchar);
    let report = &sink.reports_for(Operation::CollectColumns)[0];
    assert!(report.attribute("unknown_type").unwrap().contains("GEOMETRY"));
}

#[tokio::test]
async fn test_snapshot_json_keys() {
    let metadata = shop()
        .with_table("shop", "audit", "orders", "TABLE")
        .with_table("archive", "main", "orders", "TABLE");
    let conn = ScriptedConnection::new(metadata);
    let (ctx, _) = context();

    let snapshot = collect(&conn, &ctx).await.unwrap();
    let json = snapshot.to_json();
    let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert_eq!(
        keys,
        vec!["audit.orders", "customers", "main.orders", "orders"]
    );
    assert_eq!(json["orders"]["physicalSchema"], "main");
    assert_eq!(json["orders"]["primaryKeys"][0], "id");
    assert_eq!(json["customers"]["columns"]["id"]["scalarType"], "INTEGER");
}
