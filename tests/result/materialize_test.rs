use relbridge::result::sql_type::type_codes;
use relbridge::result::{
    materialize, materialize_explain, try_materialize, ResultColumn, ResultSet, RowFixes, SqlValue,
};
use serde_json::json;

fn result(columns: &[(&str, i32)], rows: Vec<Vec<SqlValue>>) -> ResultSet {
    let mut rs = ResultSet::new(
        columns
            .iter()
            .map(|(label, code)| ResultColumn::new(*label, *code, ""))
            .collect(),
    );
    for row in rows {
        rs.push_row(row);
    }
    rs
}

fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

#[test]
fn test_structured_rows() {
    let rs = result(
        &[
            ("id", type_codes::BIGINT),
            ("name", type_codes::VARCHAR),
            ("active", type_codes::BOOLEAN),
            ("score", type_codes::REAL),
            ("ratio", type_codes::DOUBLE),
            ("price", type_codes::DECIMAL),
            ("placed", type_codes::TIMESTAMP),
        ],
        vec![
            vec![
                SqlValue::Integer(1),
                text("Ada"),
                SqlValue::Boolean(true),
                SqlValue::Double(2.5),
                SqlValue::Double(0.125),
                text("10.50"),
                text("2024-01-31 10:00:00"),
            ],
            vec![
                SqlValue::Integer(2),
                SqlValue::Null,
                SqlValue::Integer(0),
                SqlValue::Null,
                SqlValue::Integer(3),
                SqlValue::Null,
                SqlValue::Null,
            ],
        ],
    );

    assert_eq!(
        materialize(&rs, "select * from people"),
        json!([
            {
                "id": 1, "name": "Ada", "active": true, "score": 2.5,
                "ratio": 0.125, "price": "10.50", "placed": "2024-01-31 10:00:00"
            },
            {
                "id": 2, "name": null, "active": false, "score": null,
                "ratio": 3.0, "price": null, "placed": null
            }
        ])
    );
}

#[test]
fn test_empty_result_is_empty_array() {
    let rs = result(&[("id", type_codes::INTEGER)], vec![]);
    assert_eq!(materialize(&rs, "select id from t"), json!([]));
}

#[test]
fn test_json_object_mode() {
    let rs = result(
        &[("json", type_codes::VARCHAR)],
        vec![
            vec![text(r#"{"id":1}"#)],
            vec![SqlValue::Null],
            vec![text(r#"{"id":3}"#)],
        ],
    );
    assert_eq!(
        materialize(&rs, "SELECT JSON_OBJECT('id', id) FROM t"),
        json!([r#"{"id":1}"#, null, r#"{"id":3}"#])
    );
}

#[test]
fn test_float_precision() {
    let rs = result(
        &[("f", type_codes::FLOAT)],
        vec![vec![SqlValue::Double(1.1)], vec![SqlValue::Double(0.3)]],
    );
    assert_eq!(
        materialize(&rs, "select f from t"),
        json!([{"f": 1.1}, {"f": 0.3}])
    );
}

#[test]
fn test_integer_coercions() {
    let rs = result(
        &[("n", type_codes::INTEGER)],
        vec![
            vec![text("17")],
            vec![SqlValue::Boolean(true)],
            vec![SqlValue::Double(9.75)],
        ],
    );
    assert_eq!(
        materialize(&rs, "select n from t"),
        json!([{"n": 17}, {"n": 1}, {"n": 9}])
    );
}

#[test]
fn test_other_types_dispatch_on_shape() {
    let rs = result(
        &[("tags", type_codes::ARRAY), ("attrs", type_codes::OTHER), ("blob", type_codes::OTHER)],
        vec![vec![
            SqlValue::List(vec![text("a"), SqlValue::Integer(2), SqlValue::Null]),
            SqlValue::Map(vec![
                ("size".to_string(), SqlValue::Integer(3)),
                ("nested".to_string(), SqlValue::List(vec![SqlValue::Boolean(false)])),
            ]),
            SqlValue::Bytes(vec![0xde, 0xad]),
        ]],
    );
    assert_eq!(
        materialize(&rs, "select * from t"),
        json!([{
            "tags": ["a", 2, null],
            "attrs": {"size": 3, "nested": [false]},
            "blob": "dead"
        }])
    );
}

#[test]
fn test_conversion_failure_is_error_envelope() {
    let rs = result(
        &[("ok", type_codes::VARCHAR), ("flag", type_codes::BOOLEAN)],
        vec![vec![text("x"), text("maybe")]],
    );
    assert!(try_materialize(&rs, "select * from t").is_err());

    let out = materialize(&rs, "select * from t");
    let message = out["error"].as_str().unwrap();
    assert!(message.contains("flag"), "{}", message);
    assert!(message.contains("maybe"), "{}", message);
}

#[test]
fn test_explain_keys() {
    let query = "select * from t";
    let rs = result(
        &[("id", type_codes::INTEGER), ("detail", type_codes::VARCHAR)],
        vec![
            vec![SqlValue::Integer(2), text("SCAN t")],
            vec![SqlValue::Integer(3), SqlValue::Null],
        ],
    );
    assert_eq!(
        materialize_explain(&rs, query),
        json!({
            "select * from t": "2",
            "select * from t.1.2": "SCAN t",
            "select * from t.2.1": "3",
            "select * from t.2.2": null
        })
    );
}

#[test]
fn test_explain_empty_plan() {
    let rs = result(&[("plan", type_codes::VARCHAR)], vec![]);
    assert_eq!(materialize_explain(&rs, "select 1"), json!({}));
}

#[test]
fn test_row_fixes() {
    let mut rows = json!([
        {"id": 1, "note": "null", "CONSTANT": 1},
        {"id": 2, "note": "kept"}
    ]);
    RowFixes::with_expected_fields(["id", "note", "extra"]).apply(&mut rows);
    assert_eq!(
        rows,
        json!([
            {"id": 1, "note": null},
            {"id": 2, "note": "kept", "extra": null}
        ])
    );
}

#[test]
fn test_row_fixes_leave_full_rows_alone() {
    // Expected fields are only filled in when the row is short.
    let mut rows = json!([{"a": 1, "b": 2}]);
    RowFixes::with_expected_fields(["a", "c"]).apply(&mut rows);
    assert_eq!(rows, json!([{"a": 1, "b": 2}]));

    let mut envelope = json!({"error": "boom"});
    RowFixes::with_expected_fields(["a"]).apply(&mut envelope);
    assert_eq!(envelope, json!({"error": "boom"}));
}
