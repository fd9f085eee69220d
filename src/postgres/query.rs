use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::Value;
use tokio_postgres::Client;
use tokio_postgres::types::Type;

use super::params::as_refs;
use crate::error::DbEngineError;
use crate::executor::ExecOutcome;
use crate::results::ResultSet;
use crate::translation::{PlaceholderStyle, number_placeholders};
use crate::types::RowValues;

/// Extract a `RowValues` from a `tokio_postgres` row at the given index.
///
/// # Errors
/// Returns `DbEngineError` if the column cannot be decoded.
pub fn postgres_extract_value(
    row: &tokio_postgres::Row,
    idx: usize,
) -> Result<RowValues, DbEngineError> {
    let value = match *row.columns()[idx].type_() {
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)?
            .map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)?
            .map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        Type::INT8 => row
            .try_get::<_, Option<i64>>(idx)?
            .map_or(RowValues::Null, RowValues::Int),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)?
            .map_or(RowValues::Null, |v| RowValues::Float(f64::from(v))),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(idx)?
            .map_or(RowValues::Null, RowValues::Float),
        Type::BOOL => row
            .try_get::<_, Option<bool>>(idx)?
            .map_or(RowValues::Null, RowValues::Bool),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map_or(RowValues::Null, RowValues::Timestamp),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<Value>>(idx)?
            .map_or(RowValues::Null, RowValues::JSON),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(idx)?
            .map_or(RowValues::Null, RowValues::Blob),
        // text-like and anything else decodable as a string
        _ => row
            .try_get::<_, Option<String>>(idx)?
            .map_or(RowValues::Null, RowValues::Text),
    };
    Ok(value)
}

/// Build a result set from raw Postgres rows.
///
/// # Errors
/// Returns errors from row value extraction.
pub fn build_result_set_from_rows(
    rows: &[tokio_postgres::Row],
) -> Result<ResultSet, DbEngineError> {
    let mut result_set = ResultSet::with_capacity(rows.len());
    if let Some(row) = rows.first() {
        let cols: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
        result_set.set_column_names(Arc::new(cols));
    }

    for row in rows {
        let col_count = row.columns().len();
        let mut row_values = Vec::with_capacity(col_count);
        for idx in 0..col_count {
            row_values.push(postgres_extract_value(row, idx)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

pub(crate) async fn select(
    client: &Client,
    query: &str,
    params: &[RowValues],
) -> Result<ResultSet, DbEngineError> {
    let sql = number_placeholders(query, PlaceholderStyle::Numbered);
    let rows = client.query(sql.as_ref(), &as_refs(params)).await?;
    build_result_set_from_rows(&rows)
}

pub(crate) async fn execute(
    client: &Client,
    query: &str,
    params: &[RowValues],
) -> Result<ExecOutcome, DbEngineError> {
    let sql = number_placeholders(query, PlaceholderStyle::Numbered);
    let rows_affected = client.execute(sql.as_ref(), &as_refs(params)).await?;
    Ok(ExecOutcome {
        rows_affected,
        last_insert_id: None,
    })
}

pub(crate) async fn execute_batch(client: &Client, sql: &str) -> Result<(), DbEngineError> {
    client.batch_execute(sql).await?;
    Ok(())
}
