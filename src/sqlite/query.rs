use std::sync::Arc;

use rusqlite::Statement;
use rusqlite::types::Value;

use super::manager::{SharedSqliteConnection, run_blocking};
use super::params::convert_params;
use crate::error::DbEngineError;
use crate::executor::ExecOutcome;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
/// Returns `DbEngineError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, DbEngineError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Run a prepared statement and collect every row.
///
/// Column names come from the statement, so an empty result still knows its
/// shape.
///
/// # Errors
/// Returns `DbEngineError` if query execution or value extraction fails.
pub fn build_result_set(stmt: &mut Statement, params: &[Value]) -> Result<ResultSet, DbEngineError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
    while let Some(row) = rows.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value_sync(row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

pub(crate) async fn select(
    conn: SharedSqliteConnection,
    query: &str,
    params: &[RowValues],
) -> Result<ResultSet, DbEngineError> {
    let sql = query.to_owned();
    let values = convert_params(params);
    run_blocking(conn, move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        build_result_set(&mut stmt, &values)
    })
    .await
}

pub(crate) async fn execute(
    conn: SharedSqliteConnection,
    query: &str,
    params: &[RowValues],
) -> Result<ExecOutcome, DbEngineError> {
    let sql = query.to_owned();
    let values = convert_params(params);
    run_blocking(conn, move |conn| {
        let changed = conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
        Ok(ExecOutcome {
            rows_affected: changed as u64,
            last_insert_id: Some(conn.last_insert_rowid()),
        })
    })
    .await
}

pub(crate) async fn execute_batch(
    conn: SharedSqliteConnection,
    sql: &str,
) -> Result<(), DbEngineError> {
    let sql = sql.to_owned();
    run_blocking(conn, move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
    })
    .await
}
