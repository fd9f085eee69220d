use std::future::Future;
use std::time::Duration;

use bb8::PooledConnection;

use crate::decorator::Decorator;
use crate::error::DbEngineError;
use crate::mapping::{FromRow, map_rows_into};
use crate::results::ResultSet;
use crate::sanitize::check_args;
use crate::statement::Statement;
use crate::types::{Dialect, RowValues};

#[cfg(feature = "mysql")]
use crate::mysql::MyManager;
#[cfg(feature = "postgres")]
use crate::postgres::PgManager;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteManager;

/// Result of a statement that does not return rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    /// Row id of the last insert (`SQLite` and `MySQL`).
    pub last_insert_id: Option<i64>,
}

/// A connection checked out of a relational pool. Dropping it returns the
/// connection to its pool.
pub(crate) enum SqlConn {
    #[cfg(feature = "postgres")]
    Postgres(PooledConnection<'static, PgManager>),
    #[cfg(feature = "sqlite")]
    Sqlite(PooledConnection<'static, SqliteManager>),
    #[cfg(feature = "mysql")]
    Mysql(PooledConnection<'static, MyManager>),
}

impl SqlConn {
    pub(crate) async fn select(&mut self, stmt: &Statement) -> Result<ResultSet, DbEngineError> {
        match self {
            #[cfg(feature = "postgres")]
            SqlConn::Postgres(client) => {
                crate::postgres::query::select(&client.conn, &stmt.query, &stmt.params).await
            }
            #[cfg(feature = "sqlite")]
            SqlConn::Sqlite(conn) => {
                let handle = std::sync::Arc::clone(&**conn);
                crate::sqlite::query::select(handle, &stmt.query, &stmt.params).await
            }
            #[cfg(feature = "mysql")]
            SqlConn::Mysql(conn) => {
                crate::mysql::query::select(&mut conn.conn, &stmt.query, &stmt.params).await
            }
        }
    }

    pub(crate) async fn execute(&mut self, stmt: &Statement) -> Result<ExecOutcome, DbEngineError> {
        match self {
            #[cfg(feature = "postgres")]
            SqlConn::Postgres(client) => {
                crate::postgres::query::execute(&client.conn, &stmt.query, &stmt.params).await
            }
            #[cfg(feature = "sqlite")]
            SqlConn::Sqlite(conn) => {
                let handle = std::sync::Arc::clone(&**conn);
                crate::sqlite::query::execute(handle, &stmt.query, &stmt.params).await
            }
            #[cfg(feature = "mysql")]
            SqlConn::Mysql(conn) => {
                crate::mysql::query::execute(&mut conn.conn, &stmt.query, &stmt.params).await
            }
        }
    }

    pub(crate) async fn execute_batch(&mut self, sql: &str) -> Result<(), DbEngineError> {
        match self {
            #[cfg(feature = "postgres")]
            SqlConn::Postgres(client) => crate::postgres::query::execute_batch(&client.conn, sql).await,
            #[cfg(feature = "sqlite")]
            SqlConn::Sqlite(conn) => {
                let handle = std::sync::Arc::clone(&**conn);
                crate::sqlite::query::execute_batch(handle, sql).await
            }
            #[cfg(feature = "mysql")]
            SqlConn::Mysql(conn) => crate::mysql::query::execute_batch(&mut conn.conn, sql).await,
        }
    }

    /// Record whether the connection is inside a transaction. A connection
    /// released while inside one is closed by its pool instead of reused.
    /// `SQLite` reads this from the connection itself.
    pub(crate) fn set_in_transaction(&mut self, open: bool) {
        match self {
            #[cfg(feature = "postgres")]
            SqlConn::Postgres(conn) => conn.in_transaction = open,
            #[cfg(feature = "sqlite")]
            SqlConn::Sqlite(_) => {}
            #[cfg(feature = "mysql")]
            SqlConn::Mysql(conn) => conn.in_transaction = open,
        }
    }
}

/// Per-handle settings applied to every statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExecContext {
    pub(crate) dialect: Dialect,
    pub(crate) check_args: bool,
    pub(crate) query_timeout: Option<Duration>,
}

impl ExecContext {
    fn screen(&self, params: &[RowValues]) -> Result<(), DbEngineError> {
        if self.check_args {
            check_args(params)?;
        }
        Ok(())
    }

    pub(crate) async fn query(
        &self,
        conn: &mut SqlConn,
        stmt: &Statement,
    ) -> Result<ResultSet, DbEngineError> {
        self.screen(&stmt.params)?;
        with_deadline(self.query_timeout, conn.select(stmt)).await
    }

    pub(crate) async fn execute(
        &self,
        conn: &mut SqlConn,
        stmt: &Statement,
    ) -> Result<ExecOutcome, DbEngineError> {
        self.screen(&stmt.params)?;
        with_deadline(self.query_timeout, conn.execute(stmt)).await
    }

    pub(crate) async fn select_into<T: FromRow>(
        &self,
        conn: &mut SqlConn,
        dest: &mut Vec<T>,
        table: &str,
        columns: &[&str],
        decorator: Option<Decorator>,
    ) -> Result<usize, DbEngineError> {
        let stmt = Statement::select(self.dialect, table, columns, decorator)?;
        let result_set = self.query(conn, &stmt).await?;
        map_rows_into(&result_set, dest)
    }

    pub(crate) async fn count(
        &self,
        conn: &mut SqlConn,
        table: &str,
        decorator: Option<Decorator>,
    ) -> Result<i64, DbEngineError> {
        let stmt = Statement::count(self.dialect, table, decorator);
        let result_set = self.query(conn, &stmt).await?;
        single_count(&result_set)
    }
}

/// Exactly one row with an integer in its first column.
pub(crate) fn single_count(result_set: &ResultSet) -> Result<i64, DbEngineError> {
    match result_set.results.as_slice() {
        [row] => row
            .get_by_index(0)
            .and_then(RowValues::as_int)
            .copied()
            .ok_or_else(|| {
                DbEngineError::ExecutionError("count returned a non-integer value".to_string())
            }),
        [] => Err(DbEngineError::ExecutionError(
            "count returned no rows".to_string(),
        )),
        rows => Err(DbEngineError::ExecutionError(format!(
            "count returned {} rows, expected one",
            rows.len()
        ))),
    }
}

async fn with_deadline<F, T>(limit: Option<Duration>, fut: F) -> Result<T, DbEngineError>
where
    F: Future<Output = Result<T, DbEngineError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            DbEngineError::Timeout(format!("statement exceeded {}ms", limit.as_millis()))
        })?,
        None => fut.await,
    }
}
