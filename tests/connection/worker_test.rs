#![cfg(unix)]

use std::sync::Arc;

use relbridge::config::ModelDescriptor;
use relbridge::connection::{Connection, ConnectionManager, Session};
use relbridge::error::ConnectionError;
use relbridge::metadata::SchemaIntrospector;
use relbridge::observe::{ExecContext, MemorySink, Operation};
use relbridge::types::CanonicalType;
use serde_json::json;

/// A worker that answers from canned responses. Root metadata lists a
/// federated `wh` schema; keys are only served when the request is scoped
/// to that sub-connection, columns only when it is not.
const WAREHOUSE_WORKER: &str = r#"
reply() { printf '%s\n' "{\"id\":\"$id\",\"success\":true,\"result\":$1}"; }
fail() { printf '%s\n' "{\"id\":\"$id\",\"success\":false,\"error\":{\"code\":\"$1\",\"message\":\"$2\"}}"; }
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed 's/^{"id":"\([^"]*\)".*/\1/')
  method=$(printf '%s\n' "$line" | sed 's/.*"method":"\([^"]*\)".*/\1/')
  sub=$(printf '%s\n' "$line" | sed -n 's/.*"sub_schema":"\([^"]*\)".*/\1/p')
  case "$method" in
  connection.open) reply '{"product_name":"warehouse","product_version":"1.0"}' ;;
  metadata.list_catalogs) reply '{"catalogs":["root"]}' ;;
  metadata.list_schemas) reply '{"schemas":["wh"]}' ;;
  metadata.list_table_types) reply '{"table_types":["TABLE","VIEW","INDEX"]}' ;;
  metadata.list_tables)
    reply '{"tables":[{"catalog":"root","schema":"wh","name":"sales","type":"TABLE"},{"catalog":"root","schema":"wh","name":"refunds","type":"TABLE"}]}' ;;
  metadata.get_sub_schema) reply '{"name":"wh","dialect":"sqlite","federated":true}' ;;
  metadata.get_table_location)
    case "$line" in
    *'"table":"sales"'*) reply '{"catalog":"warehouse","schema":"public"}' ;;
    *) reply '{}' ;;
    esac ;;
  metadata.get_primary_keys)
    if [ "$sub" = wh ]; then
      case "$line" in
      *'"catalog":"warehouse","schema":"public","table":"sales"'*)
        reply '{"primary_keys":[{"column_name":"sale_id","key_seq":1}]}' ;;
      *) reply '{"primary_keys":[]}' ;;
      esac
    else
      fail INVALID_REQUEST "keys belong to the sub-connection"
    fi ;;
  metadata.get_exported_keys)
    if [ "$sub" = wh ]; then reply '{"exported_keys":[]}'; else fail NOT_SUPPORTED getExportedKeys; fi ;;
  metadata.get_columns)
    if [ -z "$sub" ]; then
      reply '{"columns":[{"name":"sale_id","type_name":"BIGINT","nullable":false},{"name":"sale_date","type_name":"VARCHAR(65536)"}]}'
    else
      fail INVALID_REQUEST "columns come from the root"
    fi ;;
  query.prepare)
    case "$line" in
    *'?'*) reply '{"parameter_count":1}' ;;
    *) reply '{"parameter_count":0}' ;;
    esac ;;
  query.execute)
    case "$line" in
    *broken*)
      reply '{"columns":[{"label":"a","type_code":4},{"label":"b","type_code":4}],"rows":[[1,2],[3]]}' ;;
    *'"args":["EU"]'*)
      reply '{"columns":[{"label":"sale_id","type_code":-5},{"label":"region","type_code":12}],"rows":[[1,"EU"],[2,null]]}' ;;
    *) fail INVALID_REQUEST "unexpected arguments" ;;
    esac ;;
  *) fail METHOD_NOT_FOUND "$method" ;;
  esac
done
"#;

fn scripted_worker(script: &str) -> ModelDescriptor {
    ModelDescriptor::worker("sh", "warehouse.json")
        .with_worker_args(vec!["-c".to_string(), script.to_string()])
        .with_timeout_secs(10)
}

#[tokio::test]
async fn test_worker_snapshot_reads_keys_from_sub_connection() {
    let sink = Arc::new(MemorySink::new());
    let mut session = Session::open(
        scripted_worker(WAREHOUSE_WORKER),
        ExecContext::new(sink.clone()),
    )
    .await
    .unwrap();

    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 2);

    let sales = snapshot.get("root", "wh", "sales").unwrap();
    assert_eq!(sales.physical_catalog, "warehouse");
    assert_eq!(sales.physical_schema, "public");
    assert_eq!(sales.primary_keys, vec!["sale_id"]);
    assert!(sales.key_lookup.is_complete());
    assert_eq!(sales.column("sale_id").unwrap().scalar_type, CanonicalType::Integer);
    assert!(!sales.column("sale_id").unwrap().nullable);
    // The sub-schema reports a SQLite dialect.
    assert_eq!(
        sales.column("sale_date").unwrap().scalar_type,
        CanonicalType::Timestamp
    );

    // No location for refunds: logical names are kept.
    let refunds = snapshot.find("refunds").unwrap();
    assert_eq!(refunds.physical_catalog, "root");
    assert_eq!(refunds.physical_schema, "wh");
    assert!(refunds.primary_keys.is_empty());
    assert!(refunds.key_lookup.is_complete());

    let connect = &sink.reports_for(Operation::Connect)[0];
    assert_eq!(connect.attribute("driver"), Some("worker"));
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_worker_query_binds_arguments() {
    let mut session = Session::open(scripted_worker(WAREHOUSE_WORKER), ExecContext::default())
        .await
        .unwrap();

    let rows = session
        .query_models("select sale_id, region from sales where region = __UTF8__EU__UTF8__")
        .await;
    assert_eq!(
        rows,
        json!([
            {"sale_id": 1, "region": "EU"},
            {"sale_id": 2, "region": null}
        ])
    );

    let rows = session
        .query_models("select sale_id from sales where region = __UTF8__US__UTF8__")
        .await;
    assert!(rows["error"].as_str().unwrap().contains("unexpected arguments"));
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_worker_rows_of_wrong_width_are_rejected() {
    let mut session = Session::open(scripted_worker(WAREHOUSE_WORKER), ExecContext::default())
        .await
        .unwrap();

    let rows = session.query_models("select broken").await;
    let message = rows["error"].as_str().unwrap();
    assert!(
        message.contains("row of 1 cells for 2 columns"),
        "{}",
        message
    );
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_worker_handshake_failures() {
    let ctx = ExecContext::default();

    let refuses = r#"
read -r line
id=$(printf '%s\n' "$line" | sed 's/^{"id":"\([^"]*\)".*/\1/')
printf '%s\n' "{\"id\":\"$id\",\"success\":false,\"error\":{\"code\":\"DRIVER_NOT_FOUND\",\"message\":\"no jdbc driver\"}}"
"#;
    let err = ConnectionManager::open(&scripted_worker(refuses), &ctx)
        .await
        .err()
        .unwrap();
    assert!(
        matches!(err, ConnectionError::DriverNotFound(ref m) if m.contains("no jdbc driver")),
        "{:?}",
        err
    );

    let err = ConnectionManager::open(&scripted_worker("exit 0"), &ctx)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ConnectionError::Handshake { .. }), "{:?}", err);

    let missing = ModelDescriptor::worker("/nonexistent/relbridge-worker", "warehouse.json");
    let err = ConnectionManager::open(&missing, &ctx).await.err().unwrap();
    assert!(matches!(err, ConnectionError::DriverNotFound(_)), "{:?}", err);
}

#[tokio::test]
async fn test_worker_close_stops_the_process() {
    let ctx = ExecContext::default();
    let conn = ConnectionManager::open(&scripted_worker(WAREHOUSE_WORKER), &ctx)
        .await
        .unwrap();
    assert_eq!(conn.metadata().catalogs().await.unwrap(), vec!["root"]);

    conn.close().await.unwrap();
    assert!(conn.metadata().catalogs().await.is_err());
}
