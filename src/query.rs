//! Query pipelines: template → prepare → execute → materialize.
//!
//! Both entry points always produce JSON; any failure along the way becomes
//! an `{"error": ...}` envelope and is reported on the unit of work.

use serde_json::Value;
use tracing::warn;

use crate::connection::Connection;
use crate::error::{error_envelope, QueryExecutionError};
use crate::observe::{Counter, ExecContext, Operation};
use crate::result::{is_json_object_query, materialize_explain, try_materialize, ResultSet, RowFixes};
use crate::statement::StatementTemplater;

/// Template, prepare and execute a query, fetching every row.
pub async fn execute_query(
    conn: &dyn Connection,
    templater: &StatementTemplater,
    query: &str,
) -> Result<ResultSet, QueryExecutionError> {
    let prepared = templater.prepare(query, conn).await?;
    conn.execute(&prepared.statement)
        .await
        .map_err(QueryExecutionError::Execute)
}

/// Run a caller query and render its rows.
///
/// Row fixes, when given, apply to structured output only.
pub async fn query_models(
    conn: &dyn Connection,
    templater: &StatementTemplater,
    query: &str,
    fixes: Option<&RowFixes>,
    ctx: &ExecContext,
) -> Value {
    let mut unit = ctx.unit(Operation::PrepareAndExecute);
    unit.attribute("query", query);
    let json_mode = is_json_object_query(query);
    unit.attribute("json_object", json_mode.to_string());

    let result = match execute_query(conn, templater, query).await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "query failed");
            unit.finish_err(&e);
            return error_envelope(&e);
        }
    };
    unit.counter(Counter::Rows, result.row_count() as u64);
    unit.counter(Counter::Columns, result.column_count() as u64);

    match try_materialize(&result, query) {
        Ok(mut rows) => {
            if let (Some(fixes), false) = (fixes, json_mode) {
                fixes.apply(&mut rows);
            }
            unit.finish_ok();
            rows
        }
        Err(e) => {
            warn!(error = %e, "failed to materialize result");
            unit.finish_err(&e);
            error_envelope(&e)
        }
    }
}

/// Run the dialect's explain form of a query and flatten the plan.
pub async fn explain(
    conn: &dyn Connection,
    templater: &StatementTemplater,
    query: &str,
    ctx: &ExecContext,
) -> Value {
    let mut unit = ctx.unit(Operation::Explain);
    unit.attribute("query", query);

    let explain_sql = conn.explain_sql(query);
    match execute_query(conn, templater, &explain_sql).await {
        Ok(result) => {
            unit.counter(Counter::Rows, result.row_count() as u64);
            unit.counter(Counter::Columns, result.column_count() as u64);
            let plan = materialize_explain(&result, query);
            unit.attribute("plan", plan.to_string());
            unit.finish_ok();
            plan
        }
        Err(e) => {
            warn!(error = %e, "explain failed");
            unit.finish_err(&e);
            error_envelope(&e)
        }
    }
}
