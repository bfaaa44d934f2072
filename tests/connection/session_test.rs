#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use common::{result_set, text, ScriptedConnection, ScriptedMetadata};
use relbridge::config::{ModelDescriptor, QuerySettings};
use relbridge::connection::Session;
use relbridge::observe::{Counter, ExecContext, MemorySink, Operation};
use relbridge::result::sql_type::type_codes;
use relbridge::result::SqlValue;
use serde_json::json;

fn metadata() -> ScriptedMetadata {
    ScriptedMetadata::new()
        .with_table("db", "public", "products", "TABLE")
        .with_columns(
            "db",
            "public",
            "products",
            &[("sku", "VARCHAR", false), ("price", "DOUBLE", true)],
        )
        .with_primary_key("db", "public", "products", &["sku"])
}

fn scripted_session(conn: ScriptedConnection) -> (Session, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let session = Session::from_connection(
        ModelDescriptor::sqlite_memory(),
        Box::new(conn),
        ExecContext::new(sink.clone()),
    );
    (session, sink)
}

#[tokio::test]
async fn test_snapshot_is_collected_once() {
    let (mut session, sink) = scripted_session(ScriptedConnection::new(metadata()));
    assert!(session.cached_snapshot().is_none());

    let first = session.snapshot().await.unwrap();
    let second = session.snapshot().await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(sink.reports_for(Operation::CollectSnapshot).len(), 1);

    session.refresh();
    assert!(session.cached_snapshot().is_none());
    let third = session.snapshot().await.unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(*first, *third);
    assert_eq!(sink.reports_for(Operation::CollectSnapshot).len(), 2);
}

#[tokio::test]
async fn test_failed_snapshot_is_not_cached() {
    let (mut session, sink) = scripted_session(ScriptedConnection::new(metadata().failing("catalogs")));

    assert!(session.snapshot().await.is_err());
    assert!(session.cached_snapshot().is_none());
    assert!(session.snapshot().await.is_err());
    assert_eq!(sink.reports_for(Operation::CollectSnapshot).len(), 2);
}

#[tokio::test]
async fn test_models_json() {
    let (mut session, _) = scripted_session(ScriptedConnection::new(metadata()));
    let models = session.models_json().await.unwrap();
    assert_eq!(
        models,
        json!({
            "products": {
                "catalog": "db",
                "schema": "public",
                "name": "products",
                "physicalCatalog": "db",
                "physicalSchema": "public",
                "description": null,
                "primaryKeys": ["sku"],
                "exportedKeys": [],
                "columns": {
                    "price": {
                        "name": "price",
                        "scalarType": "DOUBLE",
                        "nullable": true,
                        "description": null
                    },
                    "sku": {
                        "name": "sku",
                        "scalarType": "VARCHAR",
                        "nullable": false,
                        "description": null
                    }
                }
            }
        })
    );
}

#[tokio::test]
async fn test_query_models_applies_fixes() {
    let sql = "select sku, note, 1 as CONSTANT from products where sku = ?";
    let conn = ScriptedConnection::new(metadata()).with_result(
        sql,
        result_set(
            &[
                ("sku", type_codes::VARCHAR),
                ("note", type_codes::VARCHAR),
                ("CONSTANT", type_codes::INTEGER),
            ],
            vec![vec![text("A-1"), text("null"), SqlValue::Integer(1)]],
        ),
    );
    let (mut session, sink) = scripted_session(conn);

    let query = "select sku, note, 1 as CONSTANT from products where sku = __UTF8__A-1__UTF8__";
    let rows = session
        .query_models_with_fields(
            query,
            &["sku".to_string(), "note".to_string(), "price".to_string(), "qty".to_string()],
        )
        .await;
    assert_eq!(
        rows,
        json!([{"sku": "A-1", "note": null, "price": null, "qty": null}])
    );

    let report = &sink.reports_for(Operation::PrepareAndExecute)[0];
    assert!(report.status.is_ok());
    assert_eq!(report.counter(Counter::Rows), Some(1));
    assert_eq!(report.counter(Counter::Columns), Some(3));
}

#[tokio::test]
async fn test_query_models_without_fixes() {
    let sql = "select note from products";
    let conn = ScriptedConnection::new(metadata()).with_result(
        sql,
        result_set(&[("note", type_codes::VARCHAR)], vec![vec![text("null")]]),
    );
    let settings = QuerySettings {
        fixes: false,
        ..QuerySettings::default()
    };
    let (session, _) = scripted_session(conn);
    let mut session = session.with_settings(&settings);

    assert_eq!(session.query_models(sql).await, json!([{"note": "null"}]));
}

#[tokio::test]
async fn test_query_failures_are_envelopes() {
    let (mut session, sink) = scripted_session(ScriptedConnection::new(metadata()).with_failing_sql("select 1"));

    let rows = session.query_models("select 1").await;
    assert!(rows["error"]
        .as_str()
        .unwrap()
        .starts_with("failed to prepare statement"));

    let rows = session.query_models("select 2").await;
    assert!(rows["error"]
        .as_str()
        .unwrap()
        .starts_with("failed to execute statement"));

    let reports = sink.reports_for(Operation::PrepareAndExecute);
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| !r.status.is_ok()));
}

#[tokio::test]
async fn test_explain_uses_dialect_form() {
    let plan_sql = "explain plan for select * from products where sku = ?";
    let conn = ScriptedConnection::new(metadata()).with_result(
        plan_sql,
        result_set(
            &[("PLAN", type_codes::VARCHAR)],
            vec![vec![text("EnumerableTableScan(table=[[db, products]])")]],
        ),
    );
    let log = conn.execution_log();
    let (mut session, sink) = scripted_session(conn);

    let query = "select * from products where sku = __UTF8__A-1__UTF8__";
    let plan = session.explain(query).await;
    let mut expected = serde_json::Map::new();
    expected.insert(
        query.to_string(),
        json!("EnumerableTableScan(table=[[db, products]])"),
    );
    assert_eq!(plan, serde_json::Value::Object(expected));

    let executed = log.lock().unwrap().clone();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].sql, plan_sql);
    assert_eq!(executed[0].params, vec!["A-1"]);
    assert!(sink.reports_for(Operation::Explain)[0].status.is_ok());
}

#[tokio::test]
async fn test_open_sqlite_session_and_reconnect() {
    let sink = Arc::new(MemorySink::new());
    let mut session = Session::open(
        ModelDescriptor::sqlite_memory(),
        ExecContext::new(sink.clone()),
    )
    .await
    .unwrap();

    assert!(session.snapshot().await.unwrap().is_empty());
    assert_eq!(
        session.query_models("select 1 as one").await,
        json!([{"one": 1}])
    );

    session.reconnect().await.unwrap();
    assert!(session.cached_snapshot().is_none());
    assert_eq!(sink.reports_for(Operation::Connect).len(), 2);
    session.close().await.unwrap();
}
