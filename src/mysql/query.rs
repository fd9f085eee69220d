use std::sync::Arc;

use chrono::NaiveDate;
use mysql_async::consts::ColumnType;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Row, Value};

use super::params::convert_params;
use crate::error::DbEngineError;
use crate::executor::ExecOutcome;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Character set id `MySQL` reports for binary columns.
const BINARY_CHARSET: u16 = 63;

/// Extract a `RowValues` from a `MySQL` row at the given index.
///
/// # Errors
/// Returns `DbEngineError::MappingError` if the index is out of range or a
/// date cannot be represented.
pub fn mysql_extract_value(row: &Row, idx: usize) -> Result<RowValues, DbEngineError> {
    let column = row
        .columns_ref()
        .get(idx)
        .ok_or_else(|| DbEngineError::MappingError(format!("no column at index {idx}")))?;
    let value = row
        .as_ref(idx)
        .ok_or_else(|| DbEngineError::MappingError(format!("no value at index {idx}")))?;
    Ok(match value {
        Value::NULL => RowValues::Null,
        Value::Int(i) => RowValues::Int(*i),
        Value::UInt(u) => i64::try_from(*u).map_or_else(|_| RowValues::Text(u.to_string()), RowValues::Int),
        Value::Float(f) => RowValues::Float(f64::from(*f)),
        Value::Double(f) => RowValues::Float(*f),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            let ts = NaiveDate::from_ymd_opt(i32::from(*year), u32::from(*month), u32::from(*day))
                .and_then(|d| {
                    d.and_hms_micro_opt(u32::from(*hour), u32::from(*minute), u32::from(*second), *micros)
                })
                .ok_or_else(|| {
                    DbEngineError::MappingError(format!(
                        "column {} holds an invalid date",
                        column.name_str()
                    ))
                })?;
            RowValues::Timestamp(ts)
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if *negative { "-" } else { "" };
            let hours = u64::from(*days) * 24 + u64::from(*hours);
            let mut text = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
            if *micros > 0 {
                text.push_str(&format!(".{micros:06}"));
            }
            RowValues::Text(text)
        }
        Value::Bytes(bytes) => {
            if column.column_type() == ColumnType::MYSQL_TYPE_JSON {
                serde_json::from_slice(bytes).map_or_else(
                    |_| RowValues::Text(String::from_utf8_lossy(bytes).into_owned()),
                    RowValues::JSON,
                )
            } else if column.character_set() == BINARY_CHARSET {
                RowValues::Blob(bytes.clone())
            } else {
                String::from_utf8(bytes.clone())
                    .map_or_else(|e| RowValues::Blob(e.into_bytes()), RowValues::Text)
            }
        }
    })
}

/// Build a result set from `MySQL` rows.
///
/// # Errors
/// Returns errors from row value extraction.
pub fn build_result_set(rows: &[Row]) -> Result<ResultSet, DbEngineError> {
    let mut result_set = ResultSet::with_capacity(rows.len());
    if let Some(row) = rows.first() {
        let cols: Vec<String> = row
            .columns_ref()
            .iter()
            .map(|c| c.name_str().into_owned())
            .collect();
        result_set.set_column_names(Arc::new(cols));
    }

    for row in rows {
        let mut row_values = Vec::with_capacity(row.len());
        for idx in 0..row.len() {
            row_values.push(mysql_extract_value(row, idx)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

pub(crate) async fn select(
    conn: &mut Conn,
    query: &str,
    params: &[RowValues],
) -> Result<ResultSet, DbEngineError> {
    let rows: Vec<Row> = conn.exec(query, convert_params(params)).await?;
    build_result_set(&rows)
}

pub(crate) async fn execute(
    conn: &mut Conn,
    query: &str,
    params: &[RowValues],
) -> Result<ExecOutcome, DbEngineError> {
    conn.exec_drop(query, convert_params(params)).await?;
    Ok(ExecOutcome {
        rows_affected: conn.affected_rows(),
        last_insert_id: conn.last_insert_id().and_then(|id| i64::try_from(id).ok()),
    })
}

pub(crate) async fn execute_batch(conn: &mut Conn, sql: &str) -> Result<(), DbEngineError> {
    conn.query_drop(sql).await?;
    Ok(())
}
